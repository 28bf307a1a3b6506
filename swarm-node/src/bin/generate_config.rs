use swarm_node::SwarmConfig;

/// Usage: generate_config [path] (defaults to config.json)
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "config.json".to_string());
    let config = SwarmConfig::default();
    config.validate()?;
    config.save_to_file(&path)?;
    println!("Config written to {}", path);
    Ok(())
}
