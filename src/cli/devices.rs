use tabled::Table;

use crate::{
    cli::{print_alerts, require_authorized, session, spinner},
    error, info,
    session::select_device,
    types::DeviceTableRow,
};

/// Lists the user's devices and marks the one a play command would target.
pub async fn devices() {
    let (controller, mut alerts) = session().await;
    require_authorized(&controller);

    let pb = spinner("Fetching devices...");
    let result = controller.list_devices().await;
    pb.finish_and_clear();

    let devices = match result {
        Ok(devices) => devices,
        Err(_) => {
            print_alerts(&mut alerts);
            error!("Cannot list devices.");
        }
    };

    if devices.is_empty() {
        info!("No devices found. Try opening the Spotify app on one of your devices.");
        return;
    }

    let selected = select_device(&devices).and_then(|d| d.id.clone());
    let rows: Vec<DeviceTableRow> = devices
        .iter()
        .map(|d| DeviceTableRow {
            selected: if d.id.is_some() && d.id == selected {
                "*".to_string()
            } else {
                String::new()
            },
            name: d.name.clone(),
            kind: d.kind.clone(),
            active: yes_no(d.is_active),
            restricted: yes_no(d.is_restricted),
        })
        .collect();

    println!("{}", Table::new(rows));
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}
