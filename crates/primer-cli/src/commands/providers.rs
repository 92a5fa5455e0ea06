//! Provider listing command

use primer_gen::config::env_var_name;
use primer_gen::{providers, Capability, PrimerConfig};

pub fn run(config: &PrimerConfig) -> bool {
    println!("{} provider(s):\n", providers::available_providers().len());
    for name in providers::available_providers() {
        let capabilities: Vec<String> = providers::capabilities(name)
            .iter()
            .map(|c| c.to_string())
            .collect();
        let selected: Vec<String> = Capability::ALL
            .iter()
            .filter(|c| config.provider_for(**c) == name)
            .map(|c| c.to_string())
            .collect();
        let keys = config.credential_pool(name).len();

        println!("  {}", name);
        println!("    Capabilities: {}", capabilities.join(", "));
        if !selected.is_empty() {
            println!("    Selected for: {}", selected.join(", "));
        }
        if !config.is_enabled(name) {
            println!("    Disabled");
        }
        if keys == 0 {
            println!(
                "    Credentials: none (set {})",
                env_var_name(name, "API_KEYS")
            );
        } else {
            println!("    Credentials: {}", keys);
        }
    }

    let mut success = true;
    for capability in Capability::ALL {
        if let Err(e) = config.validate(&[capability]) {
            println!("\n  WARNING: {}", e);
            success = false;
        }
    }
    success
}
