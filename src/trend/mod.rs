// src/trend/mod.rs

pub mod select;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::clean::{resolve, Coerced};
use crate::normalize::date::{is_trading_day, parse_date_token, ParsedDate};
use crate::table::{Cell, EntityTable};
use self::select::{closing_price_columns, SelectedColumn, RECENT_WINDOW};

/// One dated price point on a trading day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceObservation {
    pub date: NaiveDate,
    pub price: f64,
}

/// Price data collected for one entity. `prices`/`dates` are the
/// parallel regression inputs in column order (weekends included);
/// `chart` is the weekday-only chronological refinement fed to
/// visualization.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceSeries {
    pub prices: Vec<f64>,
    pub dates: Vec<String>,
    pub chart: Vec<PriceObservation>,
}

/// Trend output for one table row.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityTrend {
    pub key: String,
    pub name: String,
    pub slope_pct: f64,
    pub series: PriceSeries,
    pub degraded_key: bool,
}

/// Ordinary least squares slope of `values` against steps `0..n-1`.
/// Caller guarantees `values.len() >= 2`, which keeps the denominator
/// nonzero.
fn ols_slope(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;
    let mut num = 0.0;
    let mut den = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        den += dx * dx;
    }
    num / den
}

/// Regression slope normalized as percent of mean price per step. Zero
/// when fewer than two observations or a zero mean (defined values, not
/// errors).
pub fn slope_percent(prices: &[f64]) -> f64 {
    if prices.len() < 2 {
        return 0.0;
    }
    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
    if mean == 0.0 {
        return 0.0;
    }
    ols_slope(prices) / mean * 100.0
}

/// Weekday-only chronological refinement of the collected sequence:
/// re-parse each date, drop weekends and unparseables, sort, keep the
/// most recent [`RECENT_WINDOW`] observations.
fn chart_sequence(prices: &[f64], dates: &[String]) -> Vec<PriceObservation> {
    let mut obs: Vec<PriceObservation> = prices
        .iter()
        .zip(dates)
        .filter_map(|(price, raw)| match parse_date_token(raw) {
            ParsedDate::Parsed(date) if is_trading_day(date) => Some(PriceObservation {
                date,
                price: *price,
            }),
            ParsedDate::Parsed(date) => {
                debug!(%date, "skipping non-trading day");
                None
            }
            ParsedDate::Unparseable(s) => {
                debug!(raw = %s, "skipping unparseable chart date");
                None
            }
        })
        .collect();
    obs.sort_by_key(|o| o.date);
    if obs.len() > RECENT_WINDOW {
        obs.drain(..obs.len() - RECENT_WINDOW);
    }
    obs
}

fn entity_trend(table: &EntityTable, row: usize, cols: &[SelectedColumn]) -> EntityTrend {
    let (key, degraded_key) = resolve::entity_key(table, row);
    let name = resolve::entity_name(table, row);

    let mut prices = Vec::with_capacity(cols.len());
    let mut dates = Vec::with_capacity(cols.len());
    for col in cols {
        let value = match table.cell(row, col.index) {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => match crate::clean::coerce_numeric(s) {
                Coerced::Numeric(v) => Some(v),
                Coerced::Text(_) => None,
            },
            Cell::Null => None,
        };
        if let Some(price) = value {
            if price > 0.0 {
                prices.push(price);
                dates.push(col.date.clone());
            }
        }
    }

    let slope_pct = slope_percent(&prices);
    let chart = chart_sequence(&prices, &dates);

    EntityTrend {
        key,
        name,
        slope_pct,
        series: PriceSeries {
            prices,
            dates,
            chart,
        },
        degraded_key,
    }
}

/// Compute per-entity trends over the cleaned table. Rows are
/// independent, so they fan out across the rayon pool; the result comes
/// back in row order.
pub fn compute_trends(table: &EntityTable) -> Vec<EntityTrend> {
    let cols = closing_price_columns(table);
    if cols.len() < 2 {
        debug!(
            found = cols.len(),
            "fewer than two closing-price columns; slopes default to zero"
        );
    }
    (0..table.row_count())
        .into_par_iter()
        .map(|row| entity_trend(table, row, &cols))
        .collect()
}
