//! Command-line surface.

use clap::{Args, Parser, Subcommand};

use briefctl_core::flags::ParameterSet;

/// Operational orchestrator for the briefing collection pipeline.
///
/// Keeps the embedding backend in exactly one runtime mode, gates on
/// service readiness, and runs the collection worker for one or all
/// registered jobs with per-job log capture.
#[derive(Parser, Debug)]
#[command(name = "briefctl", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single collection job
    Run {
        /// Registered job name
        job: String,

        #[command(flatten)]
        flags: FlagArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every registered job concurrently
    RunAll {
        #[command(flatten)]
        flags: FlagArgs,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Switch the embedding backend mode: local or containerized
    Mode {
        /// Target mode
        mode: String,
    },

    /// Show the newest output artifact for a job
    Latest {
        /// Registered job name
        job: String,
    },
}

/// Worker toggle and override pass-through, mirroring the worker's own
/// command line.
///
/// Positive and negated forms may both be given (e.g. from shell aliases
/// layering defaults); the negation wins and a diagnostic is logged.
#[derive(Args, Debug, Default)]
pub struct FlagArgs {
    /// Enable the multi-stage summarization pipeline
    #[arg(long)]
    pub multi_stage: bool,
    /// Force the legacy single-stage summarizer
    #[arg(long)]
    pub single_stage: bool,

    /// Force the agentic focus section when possible
    #[arg(long)]
    pub agentic_section: bool,
    /// Disable the agentic focus section even if configured
    #[arg(long)]
    pub no_agentic_section: bool,

    /// Emit the additional condensed brief if supported
    #[arg(long)]
    pub brief_lite: bool,
    /// Skip condensed brief generation
    #[arg(long)]
    pub no_brief_lite: bool,

    /// Enable two-stage dedup
    #[arg(long)]
    pub dedup: bool,
    /// Disable two-stage dedup
    #[arg(long)]
    pub no_dedup: bool,
    /// Semantic dedup cosine threshold (0-1)
    #[arg(long)]
    pub dedup_threshold: Option<f64>,

    /// Enable the fingerprint dedup stage
    #[arg(long)]
    pub dedup_fp: bool,
    /// Disable the fingerprint dedup stage
    #[arg(long)]
    pub no_dedup_fp: bool,
    /// SimHash bits (32-128)
    #[arg(long)]
    pub dedup_fp_bits: Option<u32>,
    /// LSH band count (1-16)
    #[arg(long)]
    pub dedup_fp_bands: Option<u32>,
    /// Hamming threshold within a band family
    #[arg(long)]
    pub dedup_fp_ham: Option<u32>,

    /// Clustering algorithm (hdbscan, kmeans)
    #[arg(long)]
    pub cluster_algo: Option<String>,
    /// Minimum cluster size
    #[arg(long)]
    pub cluster_min_size: Option<u32>,
    /// K for kmeans
    #[arg(long)]
    pub cluster_k: Option<u32>,
    /// Attach noise points to the nearest cluster
    #[arg(long)]
    pub attach_noise: bool,
    /// Keep noise labels unattached
    #[arg(long)]
    pub no_attach_noise: bool,

    /// Rerank strategy (none, ce, mmr, ce+mmr)
    #[arg(long)]
    pub rerank_strategy: Option<String>,
    /// MMR lambda (0-1)
    #[arg(long)]
    pub rerank_lambda: Option<f64>,
    /// CrossEncoder model name
    #[arg(long)]
    pub rerank_model: Option<String>,

    /// Enable context packing
    #[arg(long)]
    pub pack: bool,
    /// Disable context packing
    #[arg(long)]
    pub no_pack: bool,
    /// Global token budget for context packing
    #[arg(long)]
    pub pack_budget: Option<u32>,
    /// Per-cluster minimum tokens
    #[arg(long)]
    pub pack_min: Option<u32>,
    /// Per-cluster maximum tokens
    #[arg(long)]
    pub pack_max: Option<u32>,
}

impl FlagArgs {
    /// Assemble the canonical worker flag list.
    pub fn to_params(&self) -> ParameterSet {
        let mut params = ParameterSet::new();

        // The worker spells the negation of --multi-stage as its own
        // flag, not as a no- prefix.
        if self.multi_stage {
            params.enable("multi-stage");
        }
        if self.single_stage {
            params.disable_as("multi-stage", "single-stage");
        }
        pair(
            &mut params,
            "agentic-section",
            self.agentic_section,
            self.no_agentic_section,
        );
        pair(&mut params, "brief-lite", self.brief_lite, self.no_brief_lite);

        pair(&mut params, "dedup", self.dedup, self.no_dedup);
        if let Some(threshold) = self.dedup_threshold {
            params.set("dedup-threshold", threshold.to_string());
        }
        pair(&mut params, "dedup-fp", self.dedup_fp, self.no_dedup_fp);
        if let Some(bits) = self.dedup_fp_bits {
            params.set("dedup-fp-bits", bits.to_string());
        }
        if let Some(bands) = self.dedup_fp_bands {
            params.set("dedup-fp-bands", bands.to_string());
        }
        if let Some(ham) = self.dedup_fp_ham {
            params.set("dedup-fp-ham", ham.to_string());
        }

        if let Some(algo) = &self.cluster_algo {
            params.set("cluster-algo", algo.clone());
        }
        if let Some(size) = self.cluster_min_size {
            params.set("cluster-min-size", size.to_string());
        }
        if let Some(k) = self.cluster_k {
            params.set("cluster-k", k.to_string());
        }
        pair(
            &mut params,
            "attach-noise",
            self.attach_noise,
            self.no_attach_noise,
        );

        if let Some(strategy) = &self.rerank_strategy {
            params.set("rerank-strategy", strategy.clone());
        }
        if let Some(lambda) = self.rerank_lambda {
            params.set("rerank-lambda", lambda.to_string());
        }
        if let Some(model) = &self.rerank_model {
            params.set("rerank-model", model.clone());
        }

        pair(&mut params, "pack", self.pack, self.no_pack);
        if let Some(budget) = self.pack_budget {
            params.set("pack-budget", budget.to_string());
        }
        if let Some(min) = self.pack_min {
            params.set("pack-min", min.to_string());
        }
        if let Some(max) = self.pack_max {
            params.set("pack-max", max.to_string());
        }

        params
    }
}

fn pair(params: &mut ParameterSet, name: &str, positive: bool, negated: bool) {
    params.toggle(name, positive.then_some(true));
    params.toggle(name, negated.then_some(false));
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn unset_flags_build_an_empty_parameter_set() {
        let params = FlagArgs::default().to_params();
        assert!(params.is_empty());
    }

    #[test]
    fn conflicting_pair_resolves_to_negation() {
        let args = FlagArgs {
            dedup: true,
            no_dedup: true,
            ..Default::default()
        };
        let params = args.to_params();
        assert_eq!(params.args(), vec!["--no-dedup"]);
        assert_eq!(params.diagnostics().len(), 1);
    }

    #[test]
    fn single_stage_maps_to_the_worker_flag_name() {
        let args = FlagArgs {
            single_stage: true,
            ..Default::default()
        };
        assert_eq!(args.to_params().args(), vec!["--single-stage"]);
    }

    #[test]
    fn single_stage_wins_over_multi_stage() {
        let args = FlagArgs {
            multi_stage: true,
            single_stage: true,
            ..Default::default()
        };
        let params = args.to_params();
        assert_eq!(params.args(), vec!["--single-stage"]);
        assert_eq!(params.diagnostics().len(), 1);
    }

    #[test]
    fn full_worker_surface_passes_through() {
        let args = FlagArgs {
            agentic_section: true,
            no_brief_lite: true,
            dedup_fp: true,
            dedup_fp_bits: Some(64),
            dedup_fp_bands: Some(8),
            dedup_fp_ham: Some(3),
            cluster_algo: Some("kmeans".to_string()),
            cluster_k: Some(12),
            rerank_model: Some("cross-encoder/ms-marco-MiniLM-L-6-v2".to_string()),
            pack_min: Some(200),
            pack_max: Some(1200),
            ..Default::default()
        };
        assert_eq!(
            args.to_params().args(),
            vec![
                "--agentic-section",
                "--no-brief-lite",
                "--dedup-fp",
                "--dedup-fp-bits",
                "64",
                "--dedup-fp-bands",
                "8",
                "--dedup-fp-ham",
                "3",
                "--cluster-algo",
                "kmeans",
                "--cluster-k",
                "12",
                "--rerank-model",
                "cross-encoder/ms-marco-MiniLM-L-6-v2",
                "--pack-min",
                "200",
                "--pack-max",
                "1200",
            ]
        );
    }

    #[test]
    fn scalars_and_toggles_keep_declaration_order() {
        let args = FlagArgs {
            multi_stage: true,
            dedup_threshold: Some(0.85),
            pack: true,
            pack_budget: Some(6000),
            ..Default::default()
        };
        assert_eq!(
            args.to_params().args(),
            vec![
                "--multi-stage",
                "--dedup-threshold",
                "0.85",
                "--pack",
                "--pack-budget",
                "6000"
            ]
        );
    }
}
