use snafu::Snafu;

/// A field or query value that does not satisfy the record contract.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ValidationError {
    #[snafu(display("{field} must not be blank"))]
    BlankField { field: &'static str },

    #[snafu(display("post_date must be a valid date in YYYY-MM-DD format, got `{value}`"))]
    MalformedPostDate { value: String },

    #[snafu(display("views_count must not be negative, got {value}"))]
    NegativeViews { value: i64 },

    #[snafu(display("sort_by must be one of name, post_date or views_count, got `{value}`"))]
    UnknownSortField { value: String },

    #[snafu(display("order must be either asc or desc, got `{value}`"))]
    UnknownSortOrder { value: String },
}
