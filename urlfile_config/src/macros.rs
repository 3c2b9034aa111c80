/// Macro to create a configuration value group struct.
///
/// Usage:
/// ```rust
/// mod example {
///     urlfile_config::config_group!({
///         ref test_int: usize = 42;
///         ref test_string: String = "default".to_string();
///     });
/// }
///
/// let mut group = example::ConfigValueGroup::new();
/// group.apply_env_overrides();
/// ```
///
/// This creates a `ConfigValueGroup` struct with the specified fields. Values can be overridden
/// from environment variables named `URLFILE_<GROUP>_<FIELD>`, where the group name is the last
/// segment of the module path the macro is invoked in.
#[macro_export]
macro_rules! config_group {
    ({
        $(
            $(#[$meta:meta])*
            ref $name:ident : $type:ty = $value:expr;
        )+
    }) => {
        #[allow(unused_imports)]
        use $crate::ParsableConfigValue;

        /// ConfigValueGroup struct containing all configurable values
        #[derive(Debug, Clone)]
        pub struct ConfigValueGroup {
            $(
                $(#[$meta])*
                #[allow(non_snake_case)]
                pub $name: $type,
            )+
        }

        impl Default for ConfigValueGroup {
            /// Create a new instance with default values only (no environment variable overrides).
            fn default() -> Self {
                Self {
                    $(
                        $name: {
                            let v: $type = $value;
                            v
                        },
                    )+
                }
            }
        }

        impl ConfigValueGroup {
            /// Create a new instance with default values only (no environment variable overrides).
            pub fn new() -> Self {
                Self::default()
            }

            /// The environment variable prefix for this group, e.g. `URLFILE_CACHE_`.
            pub fn env_prefix() -> String {
                let group_name = module_path!().split("::").last().unwrap_or("unknown");
                format!("URLFILE_{}_", group_name.to_uppercase())
            }

            /// Apply environment variable overrides to this configuration group.
            pub fn apply_env_overrides(&mut self) {
                let prefix = Self::env_prefix();

                $(
                    let env_var_name = format!("{prefix}{}", stringify!($name).to_uppercase());
                    let maybe_env_value = std::env::var(&env_var_name).ok();
                    let current_value: $type = self.$name.clone();
                    self.$name = <$type>::parse(&env_var_name, maybe_env_value, current_value);
                )+
            }
        }
    };
}
