//! `askpanda list-experiments`

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Available experiments:\n");
    for experiment in askpanda_experiments::all() {
        println!("  {:<10} {}", experiment.name, experiment.summary);
        println!("  {:<10} {}", "", experiment.panda_url);
    }
    Ok(())
}
