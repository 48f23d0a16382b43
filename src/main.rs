use rabbit_listeners::app::startup;

fn main() {
    std::process::exit(startup::startup());
}
