use super::*;
use rstest::rstest;

#[test]
fn test_page_request_default() {
    let request = PageRequest::default();
    assert_eq!(request.page, 1);
    assert_eq!(request.per_page, 10);
}

#[test]
fn test_page_request_offset() {
    assert_eq!(PageRequest::new(1, 20).offset(), 0);
    assert_eq!(PageRequest::new(2, 20).offset(), 20);
    assert_eq!(PageRequest::new(0, 20).offset(), 0);
}

#[test]
fn test_page_request_first_keeps_page_size() {
    let request = PageRequest::new(7, 25).first();
    assert_eq!(request, PageRequest::new(1, 25));
}

#[rstest]
#[case(PageRequest::new(1, 10), true)]
#[case(PageRequest::new(0, 10), false)]
#[case(PageRequest::new(3, 0), false)]
fn test_page_request_validity(#[case] request: PageRequest, #[case] valid: bool) {
    assert_eq!(request.is_valid(), valid);
}

#[test]
fn test_page_response_new() {
    let data = vec![1, 2, 3];
    let response = PageResponse::new(data.clone(), 1, 10, 3);

    assert_eq!(response.data, data);
    assert_eq!(response.meta.page, 1);
    assert_eq!(response.meta.per_page, 10);
    assert_eq!(response.meta.total, 3);
    assert_eq!(response.meta.total_pages, 1);
}

#[test]
fn test_page_response_pagination() {
    // 25 items, 10 per page -> 3 pages
    let response: PageResponse<i32> = PageResponse::new(vec![], 1, 10, 25);
    assert_eq!(response.meta.total_pages, 3);
}

#[test]
fn test_page_response_empty() {
    let response: PageResponse<i32> = PageResponse::new(vec![], 1, 10, 0);
    assert_eq!(response.meta.total_pages, 0);
}

#[rstest]
#[case(1, vec![1, 2, 3])]
#[case(2, vec![4, 5, 6])]
#[case(3, vec![7])]
#[case(4, vec![])]
#[case(0, vec![])]
fn test_paginate_slices(#[case] page: u32, #[case] expected: Vec<i32>) {
    let rows = vec![1, 2, 3, 4, 5, 6, 7];
    let response = PageResponse::paginate(&rows, PageRequest::new(page, 3));

    assert_eq!(response.data, expected);
    assert_eq!(response.meta.total, 7);
    assert_eq!(response.meta.total_pages, 3);
}

#[test]
fn test_paginate_pages_concatenate_to_source() {
    let rows: Vec<u32> = (0..23).collect();
    let per_page = 5;
    let first = PageResponse::paginate(&rows, PageRequest::new(1, per_page));

    let rebuilt: Vec<u32> = (1..=first.meta.total_pages)
        .flat_map(|page| PageResponse::paginate(&rows, PageRequest::new(page, per_page)).data)
        .collect();

    assert_eq!(first.meta.total_pages, 5);
    assert_eq!(rebuilt, rows);
}
