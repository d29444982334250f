//! Lifecycle of an `aws_lightsail_lb_attachment` resource.
//!
//! Every mutating call returns Lightsail operations which are awaited with
//! [`crate::waiter::wait`] before the authoritative state is read back.
//! All operations started by one call share a single `WaitSpec::timeout`
//! budget, measured from the start of that call.

use tokio::time::Instant;

use crate::error::AttachmentError;
use crate::providers::LoadBalancerApi;
use crate::resource::{AttachmentConfig, AttachmentState};
use crate::waiter::{self, OperationHandle, WaitSpec};

pub const ATTACH_ACTION: &str = "AttachInstancesToLoadBalancer";
pub const DETACH_ACTION: &str = "DetachInstancesFromLoadBalancer";

pub struct AttachmentResource<'a, A: LoadBalancerApi + ?Sized> {
    api: &'a A,
    wait_spec: WaitSpec,
}

impl<'a, A: LoadBalancerApi + ?Sized> AttachmentResource<'a, A> {
    pub fn new(api: &'a A, wait_spec: WaitSpec) -> Self {
        Self { api, wait_spec }
    }

    /// Attaches the configured instances and reads the result back.
    ///
    /// A wait that times out is only logged; the attach call was accepted.
    pub async fn create(
        &self,
        config: &AttachmentConfig,
    ) -> Result<Option<AttachmentState>, AttachmentError> {
        config.validate()?;
        let started = Instant::now();
        let id = config.load_balancer_name.as_str();

        let handles = self
            .api
            .attach_instances(id, &config.instance_list())
            .await?;
        let handles = require_operations(handles, ATTACH_ACTION)?;

        tracing::info!(
            load_balancer = %id,
            operations = handles.len(),
            "attach requested"
        );

        for handle in &handles {
            self.await_converging(id, handle, "become ready", started)
                .await?;
        }

        self.read(id).await
    }

    /// Returns `None` when the attachment no longer exists and should be
    /// dropped from state.
    pub async fn read(&self, id: &str) -> Result<Option<AttachmentState>, AttachmentError> {
        let load_balancer = match self.api.get_load_balancer(id).await {
            Ok(load_balancer) => load_balancer,
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    load_balancer = %id,
                    "Lightsail load balancer not found, removing attachment from state"
                );
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        if load_balancer.instances.is_empty() {
            tracing::warn!(
                load_balancer = %id,
                "Lightsail load balancer has no attachments, removing from state"
            );
            return Ok(None);
        }

        Ok(Some(AttachmentState {
            id: id.to_string(),
            load_balancer_name: load_balancer.name,
            instance_names: load_balancer
                .instances
                .into_iter()
                .map(|instance| instance.instance_name)
                .collect(),
        }))
    }

    /// Moves the attached instances from `prior` to `desired`. New instances
    /// are attached before stale ones are detached.
    pub async fn update(
        &self,
        prior: &AttachmentState,
        desired: &AttachmentConfig,
    ) -> Result<Option<AttachmentState>, AttachmentError> {
        desired.validate()?;
        let started = Instant::now();

        if desired.load_balancer_name != prior.load_balancer_name {
            return Err(AttachmentError::RequiresReplacement {
                field: "load_balancer_name",
            });
        }

        let id = prior.id.as_str();
        let to_attach: Vec<String> = desired
            .instance_names
            .difference(&prior.instance_names)
            .cloned()
            .collect();
        let to_detach: Vec<String> = prior
            .instance_names
            .difference(&desired.instance_names)
            .cloned()
            .collect();

        if to_attach.is_empty() && to_detach.is_empty() {
            tracing::debug!(load_balancer = %id, "instance_names unchanged");
            return self.read(id).await;
        }

        if !to_attach.is_empty() {
            let handles = self
                .api
                .attach_instances(&prior.load_balancer_name, &to_attach)
                .await?;
            let handles = require_operations(handles, ATTACH_ACTION)?;
            tracing::info!(load_balancer = %id, instances = ?to_attach, "attaching instances");

            for handle in &handles {
                self.await_converging(id, handle, "become ready", started)
                    .await?;
            }
        }

        if !to_detach.is_empty() {
            let handles = self
                .api
                .detach_instances(&prior.load_balancer_name, &to_detach)
                .await?;
            let handles = require_operations(handles, DETACH_ACTION)?;
            tracing::info!(load_balancer = %id, instances = ?to_detach, "detaching instances");

            for handle in &handles {
                self.await_converging(id, handle, "become detached", started)
                    .await?;
            }
        }

        self.read(id).await
    }

    /// Detaches every recorded instance. Unlike create and update, any wait
    /// failure is an error here.
    pub async fn delete(&self, state: &AttachmentState) -> Result<(), AttachmentError> {
        let instances = state.instance_list();
        if instances.is_empty() {
            return Ok(());
        }
        let started = Instant::now();

        let handles = match self
            .api
            .detach_instances(&state.load_balancer_name, &instances)
            .await
        {
            Ok(handles) => handles,
            Err(err) if err.is_not_found() => {
                tracing::warn!(
                    load_balancer = %state.id,
                    "Lightsail load balancer already gone, nothing to detach"
                );
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };
        let handles = require_operations(handles, DETACH_ACTION)?;

        for handle in &handles {
            waiter::wait(self.api, handle, &self.remaining_wait_spec(started))
                .await
                .map_err(|source| AttachmentError::Wait {
                    id: state.id.clone(),
                    goal: "become detached",
                    source,
                })?;
        }

        tracing::info!(load_balancer = %state.id, "attachment deleted");
        Ok(())
    }

    /// Import id is the load balancer name.
    pub async fn import(&self, id: &str) -> Result<Option<AttachmentState>, AttachmentError> {
        crate::resource::validate_load_balancer_name(id)?;
        self.read(id).await
    }

    /// Whatever is left of the timeout for a call that began at `started`.
    /// Once it is spent, each remaining operation still gets one status check.
    fn remaining_wait_spec(&self, started: Instant) -> WaitSpec {
        let remaining = self.wait_spec.timeout.saturating_sub(started.elapsed());
        self.wait_spec.clone().with_timeout(remaining)
    }

    async fn await_converging(
        &self,
        id: &str,
        handle: &OperationHandle,
        goal: &'static str,
        started: Instant,
    ) -> Result<(), AttachmentError> {
        match waiter::wait(self.api, handle, &self.remaining_wait_spec(started)).await {
            Ok(status) => {
                tracing::debug!(
                    load_balancer = %id,
                    operation = %handle,
                    %status,
                    "operation finished"
                );
                Ok(())
            }
            Err(err) if err.is_timeout() => {
                tracing::warn!(
                    load_balancer = %id,
                    error = %err,
                    "timed out waiting for attachment to {}, continuing",
                    goal
                );
                Ok(())
            }
            Err(source) => Err(AttachmentError::Wait {
                id: id.to_string(),
                goal,
                source,
            }),
        }
    }
}

fn require_operations(
    handles: Vec<OperationHandle>,
    action: &'static str,
) -> Result<Vec<OperationHandle>, AttachmentError> {
    if handles.is_empty() {
        return Err(AttachmentError::NoOperations { action });
    }
    Ok(handles)
}
