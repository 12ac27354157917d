use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use loan_sim_core::rates::{self, RateBasis, RateConversionInput};

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BasisArg {
    Monthly,
    Annual,
}

/// Arguments for rate conversion
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ConvertRateArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Rate as a fraction (e.g. 0.01 for 1%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Period the given rate refers to
    #[arg(long, value_enum, default_value = "monthly")]
    pub from: BasisArg,
}

pub fn run_convert_rate(args: ConvertRateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let conversion = match input::read_input::<RateConversionInput>(args.input.as_deref())? {
        Some(parsed) => parsed,
        None => RateConversionInput {
            rate: args.rate.ok_or("--rate is required (or provide --input)")?,
            basis: match args.from {
                BasisArg::Monthly => RateBasis::Monthly,
                BasisArg::Annual => RateBasis::Annual,
            },
        },
    };

    let result = rates::convert_rate(&conversion)?;
    Ok(serde_json::to_value(result)?)
}
