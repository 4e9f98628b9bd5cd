fn main() -> Result<(), eframe::Error> {
    // Set up logging, configured through RUST_LOG
    env_logger::init();

    // Coach requests and file dialogs are spawned onto this runtime
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            log::error!("failed to start async runtime: {err}");
            std::process::exit(1);
        }
    };
    let _guard = runtime.enter();

    wardley_mapper::run_app()
}
