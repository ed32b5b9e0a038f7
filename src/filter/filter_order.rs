use super::error::FilterError;
use super::types::{JobSort, PageRequest, SortDirection};
use crate::config::ListingConfig;

pub struct FilterOrder;

impl FilterOrder {
    /// Job sort keyword; defaults to newest first.
    pub fn job_sort(raw: Option<&str>) -> Result<JobSort, FilterError> {
        let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(JobSort::Newest);
        };
        match s.to_ascii_lowercase().as_str() {
            "newest" | "created_at desc" => Ok(JobSort::Newest),
            "oldest" | "created_at asc" => Ok(JobSort::Oldest),
            "salary" => Ok(JobSort::Salary),
            "deadline" => Ok(JobSort::Deadline),
            "popular" => Ok(JobSort::Popular),
            _ => Err(FilterError::InvalidSort(s.to_string())),
        }
    }

    /// Creation-time direction for application lists; defaults to newest first.
    pub fn direction(raw: Option<&str>) -> Result<SortDirection, FilterError> {
        let Some(s) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(SortDirection::Desc);
        };
        match s.to_ascii_lowercase().as_str() {
            "newest" | "desc" => Ok(SortDirection::Desc),
            "oldest" | "asc" => Ok(SortDirection::Asc),
            _ => Err(FilterError::InvalidSort(s.to_string())),
        }
    }

    /// Page defaults to 1; limit defaults to the configured default and is capped at the max.
    pub fn page_request(
        page: Option<&str>,
        limit: Option<&str>,
        listing: &ListingConfig,
    ) -> Result<PageRequest, FilterError> {
        let page = match page.map(str::trim).filter(|s| !s.is_empty()) {
            None => 1,
            Some(s) => match s.parse::<u32>() {
                Ok(n) if n >= 1 => n,
                _ => return Err(FilterError::InvalidPage(s.to_string())),
            },
        };

        let limit = match limit.map(str::trim).filter(|s| !s.is_empty()) {
            None => listing.default_limit,
            Some(s) => match s.parse::<u32>() {
                Ok(n) if n >= 1 => n.min(listing.max_limit),
                _ => return Err(FilterError::InvalidLimit(s.to_string())),
            },
        };

        Ok(PageRequest { page, limit })
    }
}
