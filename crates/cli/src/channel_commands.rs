use hgpost_config::PosterConfig;

/// One line per destination: name, remote channel and whether sends go out.
pub fn destination_lines(config: &PosterConfig) -> Vec<String> {
    let width = config
        .issues
        .iter()
        .map(|c| c.name.len())
        .max()
        .unwrap_or(0);

    config
        .issues
        .iter()
        .map(|c| {
            let state = if c.is_active() {
                format!("active (channel {})", c.hg_channel_id)
            } else {
                "inactive".to_string()
            };
            format!("{:<width$}  {state}", c.name)
        })
        .collect()
}

pub fn list(config: &PosterConfig) {
    if config.issues.is_empty() {
        println!("No destinations configured.");
        return;
    }
    for line in destination_lines(config) {
        println!("{line}");
    }
}
