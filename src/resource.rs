use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AttachmentError;

pub const RESOURCE_TYPE: &str = "aws_lightsail_lb_attachment";

static STARTS_WITH_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z]").expect("valid regex"));
static ALLOWED_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_\-.]+[^._\-]$").expect("valid regex"));

/// Desired state of a load balancer attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttachmentConfig {
    pub load_balancer_name: String,
    pub instance_names: BTreeSet<String>,
}

impl AttachmentConfig {
    pub fn new<I, S>(load_balancer_name: impl Into<String>, instance_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            load_balancer_name: load_balancer_name.into(),
            instance_names: instance_names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self) -> Result<(), AttachmentError> {
        validate_load_balancer_name(&self.load_balancer_name)?;

        if self.instance_names.is_empty() {
            return Err(AttachmentError::Validation(
                "instance_names must contain at least one instance".to_string(),
            ));
        }

        if self.instance_names.iter().any(|name| name.trim().is_empty()) {
            return Err(AttachmentError::Validation(
                "instance_names must not contain empty names".to_string(),
            ));
        }

        Ok(())
    }

    pub fn instance_list(&self) -> Vec<String> {
        self.instance_names.iter().cloned().collect()
    }
}

/// Recorded state of an attachment. `id` is the load balancer name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttachmentState {
    pub id: String,
    pub load_balancer_name: String,
    pub instance_names: BTreeSet<String>,
}

impl AttachmentState {
    pub fn instance_list(&self) -> Vec<String> {
        self.instance_names.iter().cloned().collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerInfo {
    pub name: String,
    pub state: Option<String>,
    pub instances: Vec<InstanceHealth>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceHealth {
    pub instance_name: String,
    pub health: String,
}

pub fn validate_load_balancer_name(name: &str) -> Result<(), AttachmentError> {
    let len = name.chars().count();
    if !(2..=255).contains(&len) {
        return Err(AttachmentError::Validation(format!(
            "load_balancer_name must be between 2 and 255 characters, got {}",
            len
        )));
    }

    if !STARTS_WITH_LETTER.is_match(name) {
        return Err(AttachmentError::Validation(
            "load_balancer_name must begin with an alphabetic character".to_string(),
        ));
    }

    if !ALLOWED_CHARACTERS.is_match(name) {
        return Err(AttachmentError::Validation(
            "load_balancer_name must contain only alphanumeric characters, underscores, hyphens, and dots, and must not end with one of '._-'"
                .to_string(),
        ));
    }

    Ok(())
}
