//! rtf - evaluates and inverts radiometric transfer functions stored as JSON
//! model files.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{
    Parser,
    ValueEnum
};
use tracing::error;
use tracing_subscriber::EnvFilter;

use rtfmodel::math::law::lawregistry::LawRegistry;
use rtfmodel::math::piecewise::inverter::{
    DEFAULT_MAX_ITERATIONS,
    DEFAULT_TOLERANCE,
    InversionSettings,
    MeasurementError,
    RootFindingMethod
};
use rtfmodel::model::modeldefinition::load_model;
use rtfmodel::model::radiometrictransferfunction::RadiometricTransferFunction;
use rtfmodel::rtferror::Result;
use rtfmodel::time::calendardate::{
    CalendarDate,
    CalendarStyle
};

const ACCEL_STEP: f64 = 0.001;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Ybp,
    Am,
    Bc,
}

impl From<Format> for CalendarStyle {
    fn from(format: Format) -> CalendarStyle {
        match format {
            Format::Ybp => CalendarStyle::Ybp,
            Format::Am => CalendarStyle::Am,
            Format::Bc => CalendarStyle::Bc,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Method {
    Bisection,
    Brent,
}

#[derive(Parser, Debug)]
#[command(name = "rtf", version)]
#[command(about = "Evaluate and invert a radiometric transfer function")]
struct Cli {
    /// JSON model file
    infile: PathBuf,

    /// Print the model summary
    #[arg(long)]
    info: bool,

    /// Calendar dates (YBP) to convert to measured radiometric ages
    #[arg(long, num_args = 1.., value_name = "YBP")]
    cal2rad: Vec<f64>,

    /// Measured radiometric ages to convert to calendar dates
    #[arg(long, num_args = 1.., value_name = "AGE", allow_negative_numbers = true)]
    rad2cal: Vec<f64>,

    /// Measurement error for --rad2cal: one symmetric value or `lower upper`
    #[arg(long, num_args = 1..=2, value_name = "ERROR")]
    error: Vec<f64>,

    /// Calendar dates (YBP) at which to report the acceleration factor
    #[arg(long, num_args = 1.., value_name = "YBP")]
    accel: Vec<f64>,

    /// Calendar used to print dates
    #[arg(long, value_enum, default_value = "ybp")]
    format: Format,

    /// Stopping tolerance of the numerical inverse
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    tolerance: f64,

    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: u64,

    #[arg(long, value_enum, default_value = "bisection")]
    method: Method,
}

impl Cli {
    fn settings(&self) -> InversionSettings {
        let method = match self.method {
            Method::Bisection => RootFindingMethod::Bisection,
            Method::Brent => RootFindingMethod::Brent,
        };
        InversionSettings::default()
            .with_tolerance(self.tolerance)
            .with_max_iterations(self.max_iterations)
            .with_method(method)
    }

    fn measurement_error(&self) -> Result<Option<MeasurementError>> {
        if self.error.is_empty() {
            Ok(None)
        } else {
            MeasurementError::from_slice(&self.error).map(Some)
        }
    }
}

fn format_date(date: &CalendarDate, style: CalendarStyle) -> String {
    format!("{:.3} {}", date.value(style), style.label())
}

/// Two-point forward difference at `ybp`, stepping backwards at the domain end.
fn acceleration(rtf: &RadiometricTransferFunction, ybp: f64) -> Result<f64> {
    let max_ybp = rtf.max_ybp();
    let (a, b) = if ybp + ACCEL_STEP <= max_ybp {
        (ybp, ybp + ACCEL_STEP)
    } else {
        (ybp - ACCEL_STEP, ybp)
    };
    let (_, rates) = rtf.derivative(Some(&[a, b]), 0)?;
    Ok(rates.first().copied().unwrap_or(f64::NAN))
}

fn run(cli: &Cli) -> Result<()> {
    let rtf = load_model(&cli.infile, &LawRegistry::new())?;
    let style = CalendarStyle::from(cli.format);

    if cli.info {
        rtf.log_summary();
        println!("{}", rtf);
    }

    for &ybp in &cli.cal2rad {
        let date = rtf.calendar_date(ybp);
        println!("{} -> {:.3}", format_date(&date, style), rtf.evaluate(ybp)?);
    }

    let settings = cli.settings();
    let measurement_error = cli.measurement_error()?;
    for &measured in &cli.rad2cal {
        let dated = rtf.invert_date(measured, measurement_error, &settings)?;
        match dated.bounds {
            Some((lower, upper)) => println!(
                "{:.3} -> {} [{}, {}]",
                measured,
                format_date(&dated.date, style),
                format_date(&lower, style),
                format_date(&upper, style)
            ),
            None => println!("{:.3} -> {}", measured, format_date(&dated.date, style)),
        }
        if let Some(special) = dated.date.special() {
            println!("    {}", special);
        }
    }

    for &ybp in &cli.accel {
        let date = rtf.calendar_date(ybp);
        println!("{} -> x{:.3}", format_date(&date, style), acceleration(&rtf, ybp)?);
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
