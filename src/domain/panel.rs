//! Price Panel
//!
//! Time-ascending rows x asset columns of gap-free prices. Cleaning and
//! alignment happen before a panel reaches the core; construction only
//! checks that those guarantees actually hold.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::error::{ensure_finite, DataError};

/// Wire form of a panel (column-major prices)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPanel {
    pub dates: Vec<NaiveDate>,
    pub assets: Vec<String>,
    pub prices: Vec<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPanel")]
pub struct PricePanel {
    dates: Vec<NaiveDate>,
    assets: Vec<String>,
    prices: Vec<Vec<f64>>,
}

impl TryFrom<RawPanel> for PricePanel {
    type Error = DataError;

    fn try_from(raw: RawPanel) -> Result<Self, Self::Error> {
        PricePanel::new(raw.dates, raw.assets, raw.prices)
    }
}

impl PricePanel {
    /// Build a panel, validating shape, ordering and finiteness
    pub fn new(
        dates: Vec<NaiveDate>,
        assets: Vec<String>,
        prices: Vec<Vec<f64>>,
    ) -> Result<Self, DataError> {
        if assets.is_empty() {
            return Err(DataError::Empty("asset universe".to_string()));
        }
        if assets.len() != prices.len() {
            return Err(DataError::LengthMismatch {
                left: assets.len(),
                right: prices.len(),
            });
        }

        let mut seen = HashSet::with_capacity(assets.len());
        for asset in &assets {
            if !seen.insert(asset.as_str()) {
                return Err(DataError::DuplicateAsset(asset.clone()));
            }
        }

        for (asset, column) in assets.iter().zip(&prices) {
            if column.len() != dates.len() {
                return Err(DataError::LengthMismatch {
                    left: dates.len(),
                    right: column.len(),
                });
            }
            ensure_finite(asset, column)?;
        }

        // Report the first row whose date does not follow its predecessor
        if let Some(row) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(DataError::UnorderedIndex(row + 1));
        }

        Ok(Self {
            dates,
            assets,
            prices,
        })
    }

    /// Number of rows (trading dates)
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn n_assets(&self) -> usize {
        self.assets.len()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn asset(&self, index: usize) -> &str {
        &self.assets[index]
    }

    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.prices[index]
    }

    /// Price series for a named asset
    pub fn column(&self, asset: &str) -> Result<&[f64], DataError> {
        self.assets
            .iter()
            .position(|a| a == asset)
            .map(|i| self.prices[i].as_slice())
            .ok_or_else(|| DataError::UnknownAsset(asset.to_string()))
    }

    /// Rows with dates in [start, end], either bound optional
    pub fn between(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, DataError> {
        let from = start.map_or(0, |s| self.dates.partition_point(|d| *d < s));
        let to = end.map_or(self.dates.len(), |e| self.dates.partition_point(|d| *d <= e));
        if from >= to {
            return Err(DataError::Empty(format!(
                "no rows between {:?} and {:?}",
                start, end
            )));
        }

        Ok(Self {
            dates: self.dates[from..to].to_vec(),
            assets: self.assets.clone(),
            prices: self.prices.iter().map(|c| c[from..to].to_vec()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect()
    }

    #[test]
    fn test_valid_panel() {
        let panel = PricePanel::new(
            dates(3),
            vec!["AAA".into(), "BBB".into()],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap();

        assert_eq!(panel.len(), 3);
        assert_eq!(panel.n_assets(), 2);
        assert_eq!(panel.column("BBB").unwrap(), &[4.0, 5.0, 6.0]);
        assert!(matches!(
            panel.column("CCC"),
            Err(DataError::UnknownAsset(_))
        ));
    }

    #[test]
    fn test_rejects_gaps_and_bad_shape() {
        let nan = PricePanel::new(dates(2), vec!["AAA".into()], vec![vec![1.0, f64::NAN]]);
        assert!(matches!(nan, Err(DataError::NonFinite { index: 1, .. })));

        let short = PricePanel::new(dates(3), vec!["AAA".into()], vec![vec![1.0, 2.0]]);
        assert!(matches!(short, Err(DataError::LengthMismatch { .. })));

        let dup = PricePanel::new(
            dates(1),
            vec!["AAA".into(), "AAA".into()],
            vec![vec![1.0], vec![2.0]],
        );
        assert!(matches!(dup, Err(DataError::DuplicateAsset(_))));
    }

    #[test]
    fn test_rejects_unordered_dates() {
        // [d0, d2, d1]: row 2 is the first date out of order
        let mut d = dates(3);
        d.swap(1, 2);
        let result = PricePanel::new(d, vec!["AAA".into()], vec![vec![1.0, 2.0, 3.0]]);
        assert!(matches!(result, Err(DataError::UnorderedIndex(2))));

        // Repeated date at row 1
        let mut d = dates(3);
        d[1] = d[0];
        let result = PricePanel::new(d, vec!["AAA".into()], vec![vec![1.0, 2.0, 3.0]]);
        assert!(matches!(result, Err(DataError::UnorderedIndex(1))));
    }

    #[test]
    fn test_between_dates() {
        let d = dates(5);
        let panel = PricePanel::new(
            d.clone(),
            vec!["AAA".into()],
            vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]],
        )
        .unwrap();

        let window = panel.between(Some(d[1]), Some(d[3])).unwrap();
        assert_eq!(window.column_at(0), &[2.0, 3.0, 4.0]);
        assert_eq!(panel.between(None, Some(d[0])).unwrap().len(), 1);
        assert_eq!(panel.between(None, None).unwrap(), panel);
        assert!(panel.between(Some(d[4]), Some(d[0])).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"{
            "dates": ["2024-01-01", "2024-01-02"],
            "assets": ["AAA"],
            "prices": [[10.0, 11.0]]
        }"#;
        let panel: PricePanel = serde_json::from_str(json).unwrap();
        assert_eq!(panel.column_at(0), &[10.0, 11.0]);

        let bad = r#"{
            "dates": ["2024-01-02", "2024-01-01"],
            "assets": ["AAA"],
            "prices": [[10.0, 11.0]]
        }"#;
        assert!(serde_json::from_str::<PricePanel>(bad).is_err());
    }
}
