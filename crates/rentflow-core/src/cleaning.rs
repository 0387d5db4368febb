//! The basic cleaning transform: inclusive price-range filtering plus
//! canonical date parsing of the review column.

use polars::prelude::*;

use crate::error::{PipelineError, Result};

pub const PRICE_COLUMN: &str = "price";
pub const REVIEW_COLUMN: &str = "last_review";
pub const REVIEW_DATE_FORMAT: &str = "%Y-%m-%d";

/// Returns a new frame holding exactly the rows whose `price` lies in
/// `[min_price, max_price]`, with `last_review` coerced to a `Date` column.
///
/// Rows with a missing or non-numeric price are treated as out of range and
/// dropped. A non-null `last_review` value that does not parse as
/// `%Y-%m-%d` fails the whole operation; a null stays null (a listing with
/// no reviews has no review date). The input frame is never mutated.
pub fn clean(df: &DataFrame, min_price: f64, max_price: f64) -> Result<DataFrame> {
    let review_dtype = column_dtype(df, REVIEW_COLUMN)?;
    column_dtype(df, PRICE_COLUMN)?;

    let price = col(PRICE_COLUMN).cast(DataType::Float64);
    let filtered = df
        .clone()
        .lazy()
        .filter(price.clone().gt_eq(lit(min_price)).and(price.lt_eq(lit(max_price))))
        .collect()?;

    // Re-cleaning an already-clean frame is a no-op.
    if review_dtype == DataType::Date {
        return Ok(filtered);
    }

    filtered
        .lazy()
        .with_column(
            col(REVIEW_COLUMN)
                .str()
                .strptime(
                    DataType::Date,
                    StrptimeOptions {
                        format: Some(REVIEW_DATE_FORMAT.into()),
                        strict: true,
                        exact: true,
                        cache: true,
                    },
                    lit("raise"),
                )
                .alias(REVIEW_COLUMN),
        )
        .collect()
        .map_err(|err| {
            PipelineError::DataFormat(format!(
                "column '{REVIEW_COLUMN}' does not hold {REVIEW_DATE_FORMAT} dates: {err}"
            ))
        })
}

fn column_dtype(df: &DataFrame, name: &str) -> Result<DataType> {
    df.column(name)
        .map(|column| column.dtype().clone())
        .map_err(|_| PipelineError::DataFormat(format!("missing required column '{name}'")))
}
