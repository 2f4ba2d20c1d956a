use std::fmt;
use std::ops::{
    Add,
    Sub
};

use chrono::{
    Days,
    NaiveDate
};

/// Calendar year that corresponds to 0 YBP.
pub const DEFAULT_PRESENT: f64 = 2000.0;

/// Length of a day in (Gregorian mean) years.
pub const DAY_IN_YEARS: f64 = 1.0 / 365.2425;

/// Reference years needed to express a YBP value in the other calendars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalendarEpochs {
    pub max_ybp: f64,
    pub flood_start_ybp: f64,
    pub flood_end_ybp: f64,
    pub present: f64,
}

impl CalendarEpochs {
    pub fn new(max_ybp: f64, flood_start_ybp: f64, flood_end_ybp: f64) -> CalendarEpochs {
        CalendarEpochs {
            max_ybp,
            flood_start_ybp,
            flood_end_ybp,
            present: DEFAULT_PRESENT,
        }
    }

    pub fn with_present(mut self, present: f64) -> Self {
        self.present = present;
        self
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Era {
    Ad,
    Bc,
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Era::Ad => write!(f, "AD"),
            Era::Bc => write!(f, "BC"),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum CalendarStyle {
    /// Years before present.
    Ybp,
    /// Anno mundi, counted from the domain maximum.
    Am,
    Ad,
    Bc,
}

impl CalendarStyle {
    pub fn label(&self) -> &'static str {
        match self {
            CalendarStyle::Ybp => "YBP",
            CalendarStyle::Am => "AM",
            CalendarStyle::Ad => "AD",
            CalendarStyle::Bc => "BC",
        }
    }
}

/// A calendar time held in YBP and viewable in the other calendars.
///
/// None of the calendars has a year zero, hence the `+ 1` in each conversion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalendarDate {
    ybp: f64,
    epochs: CalendarEpochs,
}

impl CalendarDate {
    pub fn new(ybp: f64, epochs: CalendarEpochs) -> CalendarDate {
        CalendarDate { ybp, epochs }
    }

    pub fn epochs(&self) -> &CalendarEpochs {
        &self.epochs
    }

    pub fn ybp(&self) -> f64 {
        self.ybp
    }

    pub fn am(&self) -> f64 {
        self.epochs.max_ybp - self.ybp + 1.0
    }

    pub fn ad(&self) -> f64 {
        self.epochs.present - self.ybp + 1.0
    }

    pub fn bc(&self) -> f64 {
        self.ybp - self.epochs.present + 1.0
    }

    pub fn value(&self, style: CalendarStyle) -> f64 {
        match style {
            CalendarStyle::Ybp => self.ybp(),
            CalendarStyle::Am => self.am(),
            CalendarStyle::Ad => self.ad(),
            CalendarStyle::Bc => self.bc(),
        }
    }

    /// Whole year with its AD/BC label.
    pub fn ad_bc(&self) -> (i64, Era) {
        if self.bc() >= 1.0 {
            (self.bc() as i64, Era::Bc)
        } else {
            (self.ad() as i64, Era::Ad)
        }
    }

    /// "Creation Day n" within the first week of the domain, "Flood day n"
    /// between the flood boundaries.
    pub fn special(&self) -> Option<String> {
        let epochs = &self.epochs;
        if epochs.max_ybp - self.ybp <= 7.0 * DAY_IN_YEARS {
            let day = 1.0 + (epochs.max_ybp - self.ybp) / DAY_IN_YEARS;
            Some(format!("Creation Day {}", day as i64))
        } else if self.ybp <= epochs.flood_start_ybp && self.ybp >= epochs.flood_end_ybp {
            let day = 1.0 + (epochs.flood_start_ybp - self.ybp) / DAY_IN_YEARS;
            Some(format!("Flood day {}", day as i64))
        } else {
            None
        }
    }

    /// Proleptic Gregorian date of the fractional astronomical year
    /// `present − ybp`, when representable.
    pub fn approximate_date(&self) -> Option<NaiveDate> {
        let year = self.epochs.present - self.ybp;
        if !year.is_finite() || year.abs() > 200_000.0 {
            return None;
        }
        let whole = year.floor();
        let start = NaiveDate::from_ymd_opt(whole as i32, 1, 1)?;
        let next = NaiveDate::from_ymd_opt(whole as i32 + 1, 1, 1)?;
        let days_in_year = (next - start).num_days() as f64;
        let offset = ((year - whole) * days_in_year).floor() as u64;
        start.checked_add_days(Days::new(offset))
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (year, era) = self.ad_bc();
        write!(f, "{} YBP\n{} AM\n{} {}", self.ybp as i64, self.am() as i64, year, era)?;
        if let Some(special) = self.special() {
            write!(f, "\n{}", special)?;
        }
        Ok(())
    }
}

impl From<CalendarDate> for f64 {
    fn from(date: CalendarDate) -> f64 {
        date.ybp
    }
}

impl Add<f64> for CalendarDate {
    type Output = CalendarDate;

    fn add(self, years: f64) -> CalendarDate {
        CalendarDate::new(self.ybp + years, self.epochs)
    }
}

impl Sub<f64> for CalendarDate {
    type Output = CalendarDate;

    fn sub(self, years: f64) -> CalendarDate {
        CalendarDate::new(self.ybp - years, self.epochs)
    }
}
