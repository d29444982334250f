use tabled::settings::Style;
use tabled::{Table, Tabled};

use lbattach::{AttachmentState, LoadBalancerInfo, OperationHandle, OperationStatus};

#[derive(Tabled)]
struct InstanceRow {
    #[tabled(rename = "Load Balancer")]
    load_balancer: String,
    #[tabled(rename = "Instance")]
    instance: String,
}

#[derive(Tabled)]
struct HealthRow {
    #[tabled(rename = "Instance")]
    instance: String,
    #[tabled(rename = "Health")]
    health: String,
}

#[derive(Tabled)]
struct OperationRow {
    #[tabled(rename = "Operation")]
    operation: String,
    #[tabled(rename = "Status")]
    status: String,
}

pub fn attachment_table(state: Option<&AttachmentState>) -> String {
    let Some(state) = state else {
        return "no instances attached".to_string();
    };

    let rows = state.instance_names.iter().map(|instance| InstanceRow {
        load_balancer: state.load_balancer_name.clone(),
        instance: instance.clone(),
    });

    Table::new(rows).with(Style::modern()).to_string()
}

pub fn health_table(info: &LoadBalancerInfo) -> String {
    let rows = info.instances.iter().map(|instance| HealthRow {
        instance: instance.instance_name.clone(),
        health: instance.health.clone(),
    });

    Table::new(rows).with(Style::modern()).to_string()
}

pub fn operation_table(handle: &OperationHandle, status: &OperationStatus) -> String {
    let row = OperationRow {
        operation: handle.to_string(),
        status: status.to_string(),
    };

    Table::new([row]).with(Style::modern()).to_string()
}
