use chaincheck::fetch::fetch_certificate_chain;
use chaincheck::pool::CertPool;
use chaincheck::report::{render_report, RenderOptions};
use chaincheck::verify::{ChainVerifier, VerifyOptions};
use std::env;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let target = if args.len() > 1 {
        args[1].clone()
    } else {
        "google.com:443".to_string()
    };

    let Some((host, port)) = target.rsplit_once(':') else {
        eprintln!("Usage: {} <host:port>", args[0]);
        eprintln!("Example: {} google.com:443", args[0]);
        std::process::exit(1);
    };
    let port: u16 = port.parse()?;

    let store = CertPool::system()?;
    println!("Loaded {} trust anchors from the system store", store.len());
    println!("Fetching certificate chain from {}:{}...", host, port);

    let chain = fetch_certificate_chain(host, port)?;
    let report = ChainVerifier::new(&store, VerifyOptions::for_host(host)).verify(&chain);

    print!(
        "{}",
        render_report(&chain, &report, &RenderOptions { include_pem: false })
    );

    for (idx, cert) in chain.iter().enumerate() {
        let step = report.step(idx);
        println!(
            "Certificate {}: {} ({} paths)",
            idx,
            cert.subject(),
            step.map(|s| s.path_count).unwrap_or(0)
        );
    }

    Ok(())
}
