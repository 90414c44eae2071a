//! Build circuits for a batch of functions
//!
//! Every function gets its own `Environment`, so functions are independent and
//! run on the rayon pool. Results come back in input order.

use std::sync::Once;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::CompilationConfig;
use crate::features::circuit::Circuit;
use crate::features::ssa::domain::SsaStats;
use crate::features::ssa::infrastructure::{Environment, SsaResult};
use crate::features::ssa::ports::FunctionEmitter;

/// Size the global rayon pool once (75% of cores)
pub fn init_rayon() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let num_cpus = num_cpus::get();
        let threads = std::cmp::max(1, (num_cpus * 3) / 4);

        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            Ok(()) => info!("rayon pool: {} threads (75% of {})", threads, num_cpus),
            Err(err) => warn!("rayon pool already configured: {}", err),
        }
    });
}

/// One function's finished circuit
#[derive(Debug)]
pub struct CompiledFunction {
    pub name: String,
    pub circuit: Circuit,
    pub stats: SsaStats,
}

pub struct BuildCircuitsUseCase {
    config: CompilationConfig,
}

impl BuildCircuitsUseCase {
    pub fn new(config: CompilationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompilationConfig {
        &self.config
    }

    /// Emit one function into a fresh circuit
    pub fn build_one(&self, emitter: &dyn FunctionEmitter) -> SsaResult<CompiledFunction> {
        let start = Instant::now();
        let argument_types = emitter.argument_types();
        let mut env = Environment::new(self.config.clone(), &argument_types);
        emitter.emit(&mut env)?;
        let stats = env.stats();
        let circuit = env.finish()?;

        if self.config.profiling {
            info!(
                "{}: {} gates, {} phis kept ({} removed) in {:?}",
                emitter.name(),
                circuit.gate_count(),
                stats.live_phis(),
                stats.phis_removed,
                start.elapsed()
            );
        }
        Ok(CompiledFunction {
            name: emitter.name().to_string(),
            circuit,
            stats,
        })
    }

    /// Emit every function; one failure does not stop the others
    pub fn execute(&self, emitters: &[Box<dyn FunctionEmitter>]) -> Vec<SsaResult<CompiledFunction>> {
        init_rayon();
        let start = Instant::now();

        let results: Vec<_> = emitters
            .par_iter()
            .map(|emitter| self.build_one(emitter.as_ref()))
            .collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            "built {} circuits ({} failed) in {:?}",
            results.len(),
            failed,
            start.elapsed()
        );
        results
    }
}
