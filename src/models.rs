//! Value types handed back by the shell. `Row` mirrors whatever SQLite
//! returned for an arbitrary statement, while `Fish` is the typed view of the
//! one table the shell seeds.

use std::fmt;

use rusqlite::types::Value;

/// Rows written by the lifecycle helpers and the in-memory test fixture.
pub const SEED_FISH: &[(&str, &str, i64)] = &[("Sammy", "shark", 1), ("Jamie", "cuttlefish", 7)];

#[derive(Debug, Clone, PartialEq)]
/// One result row. Column values keep their SQLite storage class and their
/// position is the only identity they have.
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn values(&self) -> &[Value] {
        &self.0
    }
}

impl fmt::Display for Row {
    /// Render the row as a tuple, e.g. `('Sammy', 'shark', 1)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (idx, value) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write_value(f, value)?;
        }
        write!(f, ")")
    }
}

fn write_value(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => write!(f, "NULL"),
        Value::Integer(n) => write!(f, "{n}"),
        Value::Real(r) => write!(f, "{r:?}"),
        Value::Text(text) => write!(f, "'{}'", text.replace('\'', "''")),
        Value::Blob(bytes) => {
            write!(f, "x'")?;
            for byte in bytes {
                write!(f, "{byte:02x}")?;
            }
            write!(f, "'")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// A row of the `fish` table.
pub struct Fish {
    pub name: String,
    pub species: String,
    /// Integer column; SQLite keeps it numeric so tanks sort as numbers.
    pub tank_number: i64,
}

impl Fish {
    pub fn new(name: &str, species: &str, tank_number: i64) -> Self {
        Self {
            name: name.to_string(),
            species: species.to_string(),
            tank_number,
        }
    }

    /// The two fish every freshly initialized database starts with.
    pub fn seed() -> Vec<Fish> {
        SEED_FISH
            .iter()
            .map(|(name, species, tank)| Fish::new(name, species, *tank))
            .collect()
    }

    /// Interpret a generic row as a fish. Returns `None` when the row does not
    /// have the `(text, text, integer)` shape of the `fish` table.
    pub fn from_row(row: &Row) -> Option<Fish> {
        match row.values() {
            [Value::Text(name), Value::Text(species), Value::Integer(tank_number)] => Some(Fish {
                name: name.clone(),
                species: species.clone(),
                tank_number: *tank_number,
            }),
            _ => None,
        }
    }
}

impl From<&Fish> for Row {
    fn from(fish: &Fish) -> Self {
        Row(vec![
            Value::Text(fish.name.clone()),
            Value::Text(fish.species.clone()),
            Value::Integer(fish.tank_number),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_renders_as_tuple() {
        let row = Row::from(&Fish::new("Sammy", "shark", 1));
        assert_eq!(row.to_string(), "('Sammy', 'shark', 1)");
    }

    #[test]
    fn row_escapes_quotes_and_renders_other_storage_classes() {
        let row = Row(vec![
            Value::Text("O'Malley".into()),
            Value::Null,
            Value::Real(2.5),
            Value::Blob(vec![0xde, 0xad]),
        ]);
        assert_eq!(row.to_string(), "('O''Malley', NULL, 2.5, x'dead')");
    }

    #[test]
    fn fish_from_row_rejects_wrong_shape() {
        let fish = Fish::new("Jamie", "cuttlefish", 7);
        assert_eq!(Fish::from_row(&Row::from(&fish)), Some(fish));
        assert_eq!(Fish::from_row(&Row(vec![Value::Integer(2)])), None);
    }
}
