use crate::core::config::data::{path_display, Config};
use std::path::Path;

impl Config {
    /// `pool_size` is the number of credentials a send would see.
    pub fn print_all(&self, config_path: &Path, pool_size: usize) {
        println!("Current configuration ({}):", path_display(config_path));
        println!("  base-url: {}", self.base_url());
        println!("  model: {}", self.model());
        match self.temperature() {
            Ok(value) => println!("  temperature: {value:.1}"),
            Err(err) => println!("  temperature: ⚠️  {err}"),
        }
        println!(
            "  preferred-credential: #{}",
            self.preferred_credential(pool_size) + 1
        );
        println!(
            "  last-good-credential: #{}",
            self.last_good_credential(pool_size) + 1
        );
        match self.reserved_credential() {
            Some(index) => println!("  emergency-credential: #{}", index + 1),
            None => println!("  emergency-credential: (none)"),
        }
        match self.failover_policy() {
            Ok(policy) => println!("  failover-skip: {}", policy.as_str()),
            Err(err) => println!("  failover-skip: ⚠️  {err}"),
        }
        match self.theme_color() {
            Ok(theme) => println!("  theme: {}", theme.as_str()),
            Err(err) => println!("  theme: ⚠️  {err}"),
        }
        if self.credential_slots.is_empty() {
            println!("  credential-slots: (none set)");
        } else {
            println!("  credential-slots:");
            for (index, slot) in self.credential_slots.iter().enumerate() {
                println!("    #{}: {slot}", index + 1);
            }
        }
    }
}
