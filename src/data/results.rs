//! CSV loading for historical Olympic swimming results

use polars::prelude::*;
use std::path::Path;
use tracing::info;

use super::DataError;

pub const YEAR_COLUMN: &str = "Year";
pub const DISTANCE_COLUMN: &str = "Distance (in meters)";
pub const RELAY_COLUMN: &str = "Relay?";
pub const STROKE_COLUMN: &str = "Stroke";
pub const GENDER_COLUMN: &str = "Gender";
pub const TEAM_COLUMN: &str = "Team";
pub const RANK_COLUMN: &str = "Rank";
pub const ATHLETE_COLUMN: &str = "Athlete";
pub const RESULTS_COLUMN: &str = "Results";

const REQUIRED_COLUMNS: [&str; 8] = [
    YEAR_COLUMN,
    DISTANCE_COLUMN,
    STROKE_COLUMN,
    GENDER_COLUMN,
    TEAM_COLUMN,
    RANK_COLUMN,
    ATHLETE_COLUMN,
    RESULTS_COLUMN,
];

/// One row of the results dataset; any cell may be missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    pub year: Option<f64>,
    pub distance: Option<String>,
    pub relay: Option<f64>,
    pub stroke: Option<String>,
    pub gender: Option<String>,
    pub team: Option<String>,
    pub rank: Option<f64>,
    pub athlete: Option<String>,
    pub results: Option<String>,
}

/// Load every row of a results CSV
///
/// All cells are read as text and numeric columns cast afterwards, so stray
/// values such as "Disqualified" become missing instead of failing the load.
pub fn load_results<P: AsRef<Path>>(csv_path: P) -> Result<Vec<ResultRow>, DataError> {
    let csv_path = csv_path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(csv_path.to_path_buf()))?
        .finish()?;

    if let Some(missing) = REQUIRED_COLUMNS.iter().find(|c| df.column(c).is_err()) {
        return Err(DataError::MissingColumn(missing.to_string()));
    }
    let has_relay = df.column(RELAY_COLUMN).is_ok();

    let mut exprs = vec![
        col(YEAR_COLUMN).cast(DataType::Float64),
        col(DISTANCE_COLUMN),
        col(STROKE_COLUMN),
        col(GENDER_COLUMN),
        col(TEAM_COLUMN),
        col(RANK_COLUMN).cast(DataType::Float64),
        col(ATHLETE_COLUMN),
        col(RESULTS_COLUMN),
    ];
    if has_relay {
        exprs.push(col(RELAY_COLUMN).cast(DataType::Float64));
    }

    let typed = df.lazy().select(exprs).collect()?;
    let rows = dataframe_to_rows(&typed, has_relay)?;

    info!("Loaded {} result rows from {:?}", rows.len(), csv_path);
    Ok(rows)
}

fn text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn dataframe_to_rows(df: &DataFrame, has_relay: bool) -> Result<Vec<ResultRow>, PolarsError> {
    let year_col = df.column(YEAR_COLUMN)?.f64()?;
    let distance_col = df.column(DISTANCE_COLUMN)?.str()?;
    let stroke_col = df.column(STROKE_COLUMN)?.str()?;
    let gender_col = df.column(GENDER_COLUMN)?.str()?;
    let team_col = df.column(TEAM_COLUMN)?.str()?;
    let rank_col = df.column(RANK_COLUMN)?.f64()?;
    let athlete_col = df.column(ATHLETE_COLUMN)?.str()?;
    let results_col = df.column(RESULTS_COLUMN)?.str()?;
    let relay_col = if has_relay {
        Some(df.column(RELAY_COLUMN)?.f64()?)
    } else {
        None
    };

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        rows.push(ResultRow {
            year: year_col.get(i),
            distance: text(distance_col.get(i)),
            relay: relay_col.and_then(|c| c.get(i)),
            stroke: text(stroke_col.get(i)),
            gender: text(gender_col.get(i)),
            team: text(team_col.get(i)),
            rank: rank_col.get(i),
            athlete: text(athlete_col.get(i)),
            results: text(results_col.get(i)),
        });
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CSV: &str = "\
Location,Year,Distance (in meters),Stroke,Relay?,Gender,Team,Athlete,Results,Rank
Tokyo,2020,100m,Backstroke,0,Men,ROC,Evgeny Rylov,52.00,1
Tokyo,2020,4x100m,Freestyle,1,Women,AUS,Australia,3:29.69,1
Tokyo,2020,200m,Individual medley,0,Women,JPN,Yui Ohashi,2:08.52,1
Tokyo,2020,100m,Butterfly,0,Men,USA,Caeleb Dressel,Disqualified,
";

    #[test]
    fn test_load_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, CSV).unwrap();

        let rows = load_results(&path).unwrap();

        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].year, Some(2020.0));
        assert_eq!(rows[0].distance.as_deref(), Some("100m"));
        assert_eq!(rows[1].relay, Some(1.0));
        assert_eq!(rows[1].team.as_deref(), Some("AUS"));
        assert_eq!(rows[2].stroke.as_deref(), Some("Individual medley"));
        assert_eq!(rows[2].rank, Some(1.0));
        assert_eq!(rows[3].rank, None);
        assert_eq!(rows[3].results.as_deref(), Some("Disqualified"));
    }

    #[test]
    fn test_load_without_relay_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(
            &path,
            "Year,Distance (in meters),Stroke,Gender,Team,Athlete,Results,Rank\n\
             1912,4x200m,Freestyle,Men,GBR,Team,10:28.6,2\n",
        )
        .unwrap();

        let rows = load_results(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].relay, None);
        assert_eq!(rows[0].rank, Some(2.0));
    }

    #[test]
    fn test_missing_required_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");
        fs::write(&path, "Year,Stroke\n2020,Freestyle\n").unwrap();

        assert!(matches!(
            load_results(&path),
            Err(DataError::MissingColumn(c)) if c == "Distance (in meters)"
        ));
    }
}
