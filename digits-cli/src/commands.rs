use clap::{Parser, Subcommand, ValueEnum};
use digit_pipeline::{NoiseKind, Task};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "digits")]
#[command(about = "Dataset tools for MNIST digit denoising and classification")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a CSV file and report accepted rows, rejections, and label counts
    Inspect {
        /// Path to the CSV file
        csv: PathBuf,

        /// How labels are encoded
        #[arg(long, value_enum, default_value_t = TaskArg::Denoise)]
        task: TaskArg,
    },

    /// Print the first n digits of a CSV file as ASCII art
    Print {
        /// Path to the CSV file
        csv: PathBuf,

        /// Number of digits to print
        #[arg(short, default_value_t = 5)]
        n: usize,
    },

    /// Load a train/test pair and show random test digits with their noisy copies
    Preview {
        /// Training CSV
        train: PathBuf,

        /// Test CSV
        test: PathBuf,

        /// Number of test digits to show
        #[arg(long)]
        count: Option<usize>,

        /// Noise model
        #[arg(long, value_enum)]
        noise: Option<NoiseArg>,

        /// Noise factor or corruption probability, in [0, 1]
        #[arg(long)]
        intensity: Option<f32>,

        /// RNG seed for reproducible noise and sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Directory to write PNG images to
        #[arg(long)]
        out: Option<PathBuf>,

        /// Magnification of written PNGs
        #[arg(long, default_value_t = 4)]
        scale: usize,

        /// JSON configuration file; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as JSON
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TaskArg {
    Denoise,
    Classify,
}

impl From<TaskArg> for Task {
    fn from(arg: TaskArg) -> Self {
        match arg {
            TaskArg::Denoise => Task::Denoise,
            TaskArg::Classify => Task::Classify,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum NoiseArg {
    Gaussian,
    SaltAndPepper,
}

impl From<NoiseArg> for NoiseKind {
    fn from(arg: NoiseArg) -> Self {
        match arg {
            NoiseArg::Gaussian => NoiseKind::Gaussian,
            NoiseArg::SaltAndPepper => NoiseKind::SaltAndPepper,
        }
    }
}
