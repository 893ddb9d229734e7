pub fn run() -> anyhow::Result<()> {
    println!("costtrail {}", env!("CARGO_PKG_VERSION"));
    println!("Cost tracking for coding-agent task logs");
    Ok(())
}
