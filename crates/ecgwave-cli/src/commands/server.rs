use std::io;

use ecgwave_server::ServerConfig;

pub fn run(config: ServerConfig) -> io::Result<()> {
    let base = format!("http://{}:{}", config.host, config.port);
    let ws = format!("ws://{}:{}", config.host, config.port);

    println!("ECG server v{}", ecgwave_core::VERSION);
    println!("   {base}");
    println!("   generator: {}", config.generator);
    println!(
        "   CORS origin: {}",
        config.allowed_origin.as_deref().unwrap_or("*")
    );
    match &config.store_path {
        Some(path) => println!("   records: {}", path.display()),
        None => println!("   records: in memory"),
    }
    println!();
    println!("   Endpoints:");
    println!("     GET  /                      Health check");
    println!("     POST /api/ecg               Save {{signal, patientId}}");
    println!("     GET  /api/ecg?patientId=..  List a patient's recordings");
    println!("     GET  /api/ecg/{{idECG}}       Fetch one recording");
    println!("     POST /api/samples           Relay a sample to every viewer");
    println!("     WS   /ws                    Live samples");
    println!("     WS   /ws/pulse              One reading per second");
    println!();
    println!("   Examples:");
    println!("     curl {base}");
    println!(
        "     curl -X POST {base}/api/ecg -H 'content-type: application/json' \\"
    );
    println!("          -d '{{\"signal\":[0.1,0.2],\"patientId\":\"p1\"}}'");
    println!("     websocat {ws}/ws");
    println!();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(ecgwave_server::run_server(config))
}
