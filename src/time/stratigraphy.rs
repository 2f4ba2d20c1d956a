use std::fmt;

// ─────────────────────────────────────────────
// Geologic time scale lookup
// ─────────────────────────────────────────────
//
// Only part of the scale is tabulated: epochs exist for the Cenozoic and the
// Carboniferous, periods go back to the Ediacaran and eras to the
// Paleoproterozoic. Ages are in years; a unit owns (lower, upper].

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum StratigraphicLevel {
    Eon,
    Era,
    Period,
    Epoch,
}

impl StratigraphicLevel {
    pub fn name(&self) -> &'static str {
        match self {
            StratigraphicLevel::Eon => "eon",
            StratigraphicLevel::Era => "era",
            StratigraphicLevel::Period => "period",
            StratigraphicLevel::Epoch => "epoch",
        }
    }

    fn brackets(&self) -> &'static [f64] {
        match self {
            StratigraphicLevel::Epoch => &EPOCH_BRACKETS,
            StratigraphicLevel::Period => &PERIOD_BRACKETS,
            StratigraphicLevel::Era => &ERA_BRACKETS,
            StratigraphicLevel::Eon => &EON_BRACKETS,
        }
    }
}

// upper bound → name, youngest first
const EPOCHS: [(f64, &str); 7] = [
    (11_700.0, "Holocene"),
    (2.58e6, "Pleistocene"),
    (5.333e6, "Pliocene"),
    (23.03e6, "Miocene"),
    (33.9e6, "Oligocene"),
    (56.0e6, "Eocene"),
    (66.0e6, "Paleocene"),
];

const CARBONIFEROUS_EPOCHS: [(f64, &str); 2] = [
    (323.2e6, "Pennsylvanian"),
    (358.9e6, "Mississippian"),
];

const CARBONIFEROUS_BASE: f64 = 298.9e6;

const PERIODS: [(f64, &str); 13] = [
    (2.58e6, "Quaternary"),
    (23.03e6, "Neogene"),
    (66.0e6, "Paleogene"),
    (145.0e6, "Cretaceous"),
    (201.6e6, "Jurassic"),
    (251.902e6, "Triassic"),
    (298.9e6, "Permian"),
    (358.9e6, "Carboniferous"),
    (419.2e6, "Devonian"),
    (443.8e6, "Silurian"),
    (485.4e6, "Ordovician"),
    (541.0e6, "Cambrian"),
    (635.0e6, "Ediacaran"),
];

const ERAS: [(f64, &str); 6] = [
    (66.0e6, "Cenozoic"),
    (251.902e6, "Mesozoic"),
    (541.0e6, "Paleozoic"),
    (1000.0e6, "Neoproterozoic"),
    (1600.0e6, "Mesoproterozoic"),
    (2500.0e6, "Paleoproterozoic"),
];

const EONS: [(f64, &str); 4] = [
    (541.0e6, "Phanerozoic"),
    (2500.0e6, "Proterozoic"),
    (3600.0e6, "Archean"),
    (4600.0e6, "Hadean"),
];

const EPOCH_BRACKETS: [f64; 11] = [
    0.0, 11_700.0, 2.58e6, 5.333e6, 23.03e6, 33.9e6, 56.0e6, 66.0e6, 298.9e6, 323.2e6, 358.9e6,
];

const PERIOD_BRACKETS: [f64; 14] = [
    0.0, 2.58e6, 23.03e6, 66.0e6, 145.0e6, 201.6e6, 251.902e6, 298.9e6, 358.9e6, 419.2e6, 443.8e6,
    485.4e6, 541.0e6, 635.0e6,
];

const ERA_BRACKETS: [f64; 7] = [0.0, 66.0e6, 251.902e6, 541.0e6, 1000.0e6, 1600.0e6, 2500.0e6];

const EON_BRACKETS: [f64; 5] = [0.0, 541.0e6, 2500.0e6, 3600.0e6, 4600.0e6];

fn lookup(table: &[(f64, &'static str)], age: f64) -> Option<&'static str> {
    table.iter().find(|(upper, _)| age <= *upper).map(|(_, name)| *name)
}

/// Names of the units enclosing a radiometric age.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StratigraphicUnit {
    age: f64,
    eon: Option<&'static str>,
    era: Option<&'static str>,
    period: Option<&'static str>,
    epoch: Option<&'static str>,
}

impl StratigraphicUnit {
    pub fn new(age: f64) -> StratigraphicUnit {
        let epoch = lookup(&EPOCHS, age).or_else(|| {
            if age > CARBONIFEROUS_BASE {
                lookup(&CARBONIFEROUS_EPOCHS, age)
            } else {
                None
            }
        });
        StratigraphicUnit {
            age,
            eon: lookup(&EONS, age),
            era: lookup(&ERAS, age),
            period: lookup(&PERIODS, age),
            epoch,
        }
    }

    pub fn age(&self) -> f64 {
        self.age
    }

    pub fn name(&self, level: StratigraphicLevel) -> Option<&'static str> {
        match level {
            StratigraphicLevel::Eon => self.eon,
            StratigraphicLevel::Era => self.era,
            StratigraphicLevel::Period => self.period,
            StratigraphicLevel::Epoch => self.epoch,
        }
    }

    /// Finest level with a name.
    pub fn finest_level(&self) -> Option<StratigraphicLevel> {
        [
            StratigraphicLevel::Epoch,
            StratigraphicLevel::Period,
            StratigraphicLevel::Era,
            StratigraphicLevel::Eon,
        ]
        .into_iter()
        .find(|&level| self.name(level).is_some())
    }

    /// `(lower, upper)` boundary ages of the unit at `level`.
    pub fn brackets(&self, level: StratigraphicLevel) -> Option<(f64, f64)> {
        self.name(level)?;
        level
            .brackets()
            .windows(2)
            .find(|w| self.age > w[0] && self.age <= w[1])
            .map(|w| (w[0], w[1]))
    }

    /// Unit name at `level` (finest available by default), optionally
    /// prefixed with the relative position inside the unit.
    pub fn unit_name(
        &self,
        subdivide: bool,
        level: Option<StratigraphicLevel>,
    ) -> Option<(String, StratigraphicLevel)> {
        let level = level.or_else(|| self.finest_level())?;
        let name = self.name(level)?;
        let decorator = match (subdivide, self.brackets(level)) {
            (true, Some((lower, upper))) => {
                let position = (self.age - lower) / (upper - lower);
                if position < 0.05 {
                    "End "
                } else if position <= 0.3 {
                    "Late "
                } else if position <= 0.7 {
                    "Middle "
                } else if position <= 0.95 {
                    "Early "
                } else {
                    "Start "
                }
            }
            _ => "",
        };
        Some((format!("{}{}", decorator, name), level))
    }
}

impl fmt::Display for StratigraphicUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Ma", self.age / 1e6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_every_level_in_the_cenozoic() {
        let unit = StratigraphicUnit::new(40.0e6);
        assert_eq!(unit.name(StratigraphicLevel::Epoch), Some("Eocene"));
        assert_eq!(unit.name(StratigraphicLevel::Period), Some("Paleogene"));
        assert_eq!(unit.name(StratigraphicLevel::Era), Some("Cenozoic"));
        assert_eq!(unit.name(StratigraphicLevel::Eon), Some("Phanerozoic"));
        assert_eq!(unit.finest_level(), Some(StratigraphicLevel::Epoch));
    }

    #[test]
    fn carboniferous_has_epochs_but_permian_does_not() {
        assert_eq!(StratigraphicUnit::new(310.0e6).name(StratigraphicLevel::Epoch), Some("Pennsylvanian"));
        assert_eq!(StratigraphicUnit::new(340.0e6).name(StratigraphicLevel::Epoch), Some("Mississippian"));
        let permian = StratigraphicUnit::new(280.0e6);
        assert_eq!(permian.name(StratigraphicLevel::Epoch), None);
        assert_eq!(permian.finest_level(), Some(StratigraphicLevel::Period));
    }

    #[test]
    fn precambrian_falls_back_to_coarser_levels() {
        let unit = StratigraphicUnit::new(3000.0e6);
        assert_eq!(unit.finest_level(), Some(StratigraphicLevel::Eon));
        assert_eq!(unit.name(StratigraphicLevel::Eon), Some("Archean"));
        assert_eq!(StratigraphicUnit::new(5000.0e6).finest_level(), None);
    }

    #[test]
    fn brackets_enclose_the_age() {
        let unit = StratigraphicUnit::new(100.0e6);
        assert_eq!(unit.brackets(StratigraphicLevel::Period), Some((66.0e6, 145.0e6)));
        assert_eq!(unit.brackets(StratigraphicLevel::Epoch), None);
    }

    #[test]
    fn unit_names_are_decorated_by_position() {
        let late = StratigraphicUnit::new(70.0e6);
        assert_eq!(
            late.unit_name(true, None),
            Some(("Late Cretaceous".to_owned(), StratigraphicLevel::Period))
        );
        let start = StratigraphicUnit::new(144.0e6);
        assert_eq!(start.unit_name(true, None).unwrap().0, "Start Cretaceous");
        assert_eq!(start.unit_name(false, Some(StratigraphicLevel::Era)).unwrap().0, "Mesozoic");
    }

    #[test]
    fn displays_in_mega_annum() {
        assert_eq!(StratigraphicUnit::new(2.5e6).to_string(), "2.5 Ma");
    }
}
