use serde::Serialize;

use super::Pagination;

/// Success envelope: `{"status":"success","message":..,"data":..}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            data,
        }
    }
}

/// One page of results with navigation metadata.
#[derive(Debug, Serialize)]
pub struct PagedResponse<T> {
    pub data: Vec<T>,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub limit: i64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T: Serialize> PagedResponse<T> {
    pub fn new(data: Vec<T>, total_count: i64, pagination: Pagination) -> Self {
        let total_pages = (total_count + pagination.limit - 1) / pagination.limit;
        Self {
            data,
            total_count,
            total_pages,
            current_page: pagination.page,
            limit: pagination.limit,
            has_next: pagination.page < total_pages,
            has_previous: pagination.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_metadata() {
        let page = PagedResponse::new(vec![1, 2], 5, Pagination::new(2, 2));
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);
        assert!(page.has_previous);

        let empty: PagedResponse<i32> = PagedResponse::new(vec![], 0, Pagination::default());
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_previous);
    }
}
