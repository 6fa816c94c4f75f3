use tekscope::{Oscilloscope, ScopeConfig, Transport};

fn main() -> tekscope::Result<()> {
    env_logger::init();
    let mut host = None;
    let mut transport = Transport::Scpi;
    let mut channels = Vec::new();
    for arg in std::env::args().skip(1) {
        if arg == "--http" {
            transport = Transport::Http;
        } else if host.is_none() {
            host = Some(arg);
        } else {
            channels.push(arg);
        }
    }
    let Some(host) = host else {
        eprintln!("usage: tekscope-dump [--http] <host> <channel>...");
        std::process::exit(1);
    };
    if channels.is_empty() {
        channels.push("CH1".to_string());
    }
    let config = ScopeConfig { transport, print_idn: true, ..ScopeConfig::new(host) };
    let mut scope = Oscilloscope::connect(config)?;
    let channels = channels.iter().map(String::as_str).collect::<Vec<_>>();
    let data = scope.get_data(&channels)?;
    for source in data.sources() {
        let samples = data.channel(source)?;
        println!("{}: {} samples, first 8: {:?}",
            source, samples.len(), &samples[..samples.len().min(8)]);
    }
    Ok(())
}
