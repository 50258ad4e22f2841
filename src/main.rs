fn main() -> anyhow::Result<()> {
    seo_robots::run()?;
    Ok(())
}
