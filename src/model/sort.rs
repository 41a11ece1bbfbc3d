use std::cmp::{Ordering, Reverse};

use derive_new::new;
use serde::{Deserialize, Serialize};

use super::{UnknownSortFieldSnafu, UnknownSortOrderSnafu, ValidationError, Video};

/// The field a video listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    Name,
    PostDate,
    ViewsCount,
}

impl SortBy {
    /// Compares two videos on this field only.
    ///
    /// Names are compared by their lowercase form, so `apple` and `Apple` tie.
    pub fn compare(self, a: &Video, b: &Video) -> Ordering {
        match self {
            Self::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            Self::PostDate => a.post_date.cmp(&b.post_date),
            Self::ViewsCount => a.views_count.cmp(&b.views_count),
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "name" => Ok(Self::Name),
            "post_date" => Ok(Self::PostDate),
            "views_count" => Ok(Self::ViewsCount),
            _ => UnknownSortFieldSnafu { value: input }.fail(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl std::str::FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "asc" => Ok(Self::Ascending),
            "desc" => Ok(Self::Descending),
            _ => UnknownSortOrderSnafu { value: input }.fail(),
        }
    }
}

/// How a listing should be presented. Without a field the stored order is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, new)]
pub struct ListQuery {
    pub sort_by: Option<SortBy>,
    pub order: SortOrder,
}

impl ListQuery {
    /// Builds a query from raw parameter values, where `None` means the
    /// parameter was not given at all.
    pub fn parse(sort_by: Option<&str>, order: Option<&str>) -> Result<Self, ValidationError> {
        let sort_by = sort_by.map(str::parse::<SortBy>).transpose()?;
        let order = order
            .map(str::parse::<SortOrder>)
            .transpose()?
            .unwrap_or_default();

        Ok(Self { sort_by, order })
    }

    /// Sorts in place. The sort is stable in both directions: videos that
    /// compare equal keep their stored relative order.
    pub fn sort(&self, videos: &mut [Video]) {
        let Some(sort_by) = self.sort_by else {
            return;
        };

        // Lowercasing allocates, so names are folded once per video.
        match (sort_by, self.order) {
            (SortBy::Name, SortOrder::Ascending) => {
                videos.sort_by_cached_key(|video| video.name.to_lowercase())
            }
            (SortBy::Name, SortOrder::Descending) => {
                videos.sort_by_cached_key(|video| Reverse(video.name.to_lowercase()))
            }
            (_, SortOrder::Ascending) => videos.sort_by(|a, b| sort_by.compare(a, b)),
            (_, SortOrder::Descending) => videos.sort_by(|a, b| sort_by.compare(b, a)),
        }
    }
}
