//! Endpoint listing for `--list`

use crate::listener::Endpoint;
use colored::Colorize;

/// One line per endpoint: id, factory, queues and handler
pub fn format_endpoint(endpoint: &Endpoint, use_color: bool) -> String {
    let queues = endpoint.all_queue_names().join(", ");
    let handler = endpoint.handler().to_string();

    if use_color {
        format!(
            "{} [{}] {} -> {}",
            endpoint.id().bold(),
            endpoint.container_factory().dimmed(),
            queues.green(),
            handler.cyan()
        )
    } else {
        format!(
            "{} [{}] {} -> {}",
            endpoint.id(),
            endpoint.container_factory(),
            queues,
            handler
        )
    }
}

pub fn display_endpoints(endpoints: &[Endpoint], use_color: bool) {
    if endpoints.is_empty() {
        eprintln!("No listener endpoints discovered.");
        return;
    }
    for endpoint in endpoints {
        println!("{}", format_endpoint(endpoint, use_color));
    }
}
