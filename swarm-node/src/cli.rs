use std::path::PathBuf;

use clap::Parser;

use crate::config::SwarmConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "swarm-node", about = "Byzantine-tolerant swarm token census")]
pub struct Args {
    /// JSON config; a default one is written if the file does not exist.
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    #[arg(long)]
    pub rounds: Option<u64>,

    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub log_folder: Option<PathBuf>,
}

impl Args {
    /// Command-line values win over the file.
    pub fn apply(&self, config: &mut SwarmConfig) {
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(folder) = &self.log_folder {
            config.log_folder = Some(folder.clone());
        }
    }
}
