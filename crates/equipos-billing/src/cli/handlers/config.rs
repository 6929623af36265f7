use crate::config::EquiposConfig;
use crate::error::Result;

pub fn handle_gen_config(toml: bool) -> Result<()> {
    let rendered = if toml {
        EquiposConfig::generate_example_toml()?
    } else {
        EquiposConfig::generate_example()?
    };
    println!("{}", rendered);
    Ok(())
}
