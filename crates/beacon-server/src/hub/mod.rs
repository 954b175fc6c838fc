//! The sample hub surface: `Greeting` and `RemoteIncrement`.

pub mod counter;
pub mod greeting;

use crate::config::ServerConfig;
use crate::rpc::registry::MethodRegistry;

/// Register every hub method.
pub fn register_all(registry: &mut MethodRegistry, config: &ServerConfig) {
    registry.register("Greeting", greeting::Greeting::new(config.greeting_delay()));
    registry.register("RemoteIncrement", counter::RemoteIncrement);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_both_methods() {
        let mut registry = MethodRegistry::new();
        register_all(&mut registry, &ServerConfig::default());
        assert_eq!(registry.methods(), vec!["Greeting", "RemoteIncrement"]);
    }
}
