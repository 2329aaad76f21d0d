use common::LogQuery;

/// Query criteria chosen by the user. Empty strings mean "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub stake_username: Option<String>,
    pub level: Option<String>,
}

impl FilterCriteria {
    /// Builds criteria from raw text inputs, normalizing blanks to absent.
    pub fn new(stake_username: impl Into<String>, level: impl Into<String>) -> Self {
        Self {
            stake_username: Some(stake_username.into()),
            level: Some(level.into()),
        }
        .normalized()
    }

    pub fn by_username(stake_username: impl Into<String>) -> Self {
        Self::new(stake_username, "")
    }

    pub fn by_level(level: impl Into<String>) -> Self {
        Self::new("", level)
    }

    pub fn normalized(&self) -> Self {
        Self {
            stake_username: non_empty(self.stake_username.as_deref()),
            level: non_empty(self.level.as_deref()),
        }
    }

    /// The outbound query: only non-absent criteria, plus paging when active.
    pub fn to_query(&self, page: Option<PageState>) -> LogQuery {
        let criteria = self.normalized();
        LogQuery {
            stake_username: criteria.stake_username,
            level: criteria.level,
            page: page.map(|p| p.number),
            limit: page.map(|p| p.size),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Position in a paginated listing. Both fields are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub number: u32,
    pub size: u32,
}

impl PageState {
    pub fn first(size: u32) -> Self {
        Self {
            number: 1,
            size: size.max(1),
        }
    }

    pub fn next(self) -> Self {
        Self {
            number: self.number.saturating_add(1),
            ..self
        }
    }
}
