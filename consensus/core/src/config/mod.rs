pub mod constants;
pub mod genesis;
pub mod params;

use params::Params;
use std::ops::Deref;

/// Chain configuration: consensus params plus node-local switches. Use `Config::new` for directly
/// building from a `Params` instance, or `ConfigBuilder` for anything more complex. NOTE: this
/// struct can be implicitly de-refed into `Params`
#[derive(Clone, Debug)]
pub struct Config {
    /// Consensus params
    pub params: Params,

    //
    // Additional configuration arguments which are not consensus sensitive
    //
    /// Initialize an empty chain from the genesis block
    pub process_genesis: bool,

    /// Cross-check stored state after every chain mutation
    pub enable_sanity_checks: bool,
}

impl Config {
    pub fn new(params: Params) -> Self {
        Self { params, process_genesis: true, enable_sanity_checks: false }
    }

    pub fn to_builder(&self) -> ConfigBuilder {
        ConfigBuilder { config: self.clone() }
    }
}

impl AsRef<Params> for Config {
    fn as_ref(&self) -> &Params {
        &self.params
    }
}

impl Deref for Config {
    type Target = Params;

    fn deref(&self) -> &Self::Target {
        &self.params
    }
}

pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new(params: Params) -> Self {
        Self { config: Config::new(params) }
    }

    pub fn edit_consensus_params<F>(mut self, edit_func: F) -> Self
    where
        F: Fn(&mut Params),
    {
        edit_func(&mut self.config.params);
        self
    }

    pub fn apply_args<F>(mut self, edit_func: F) -> Self
    where
        F: Fn(&mut Config),
    {
        edit_func(&mut self.config);
        self
    }

    pub fn enable_sanity_checks(mut self) -> Self {
        self.config.enable_sanity_checks = true;
        self
    }

    pub fn skip_adding_genesis(mut self) -> Self {
        self.config.process_genesis = false;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
