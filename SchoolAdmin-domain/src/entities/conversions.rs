use serde_json::Value;

use school_admin_data::models::{ListParams, ListResponse};

use crate::entities::resource::ResourceItem;
use crate::services::pagination::{Page, Pagination};
use crate::services::query::Query;
use crate::services::resource_client::ClientError;

/// Conversion functions between wire models and domain types
/// These functions follow the pattern convert_to_[target_layer]_[model_name]

/// Convert a query into list request parameters
///
/// The page number is only carried while the query is paged.
pub fn convert_to_data_params(query: &Query) -> ListParams {
    ListParams {
        search: query.search.clone(),
        per_page: query.items_per_page,
        page: query.items_per_page.map(|_| query.current_page.max(1)),
        filters: query.filters.clone(),
    }
}

/// Convert a domain item into the JSON body sent to the backend
pub fn convert_to_data_item<T: ResourceItem>(item: &T) -> Result<Value, ClientError> {
    serde_json::to_value(item).map_err(|e| {
        ClientError::Shape(format!("cannot encode {} item: {}", T::RESOURCE.name, e))
    })
}

/// Convert a JSON item from the backend into a domain item
pub fn convert_to_domain_item<T: ResourceItem>(value: Value) -> Result<T, ClientError> {
    serde_json::from_value(value).map_err(|e| {
        ClientError::Shape(format!("unexpected {} item: {}", T::RESOURCE.name, e))
    })
}

/// Convert a list envelope into a typed page with normalized counters
pub fn convert_to_domain_page<T: ResourceItem>(
    response: ListResponse<Value>,
) -> Result<Page<T>, ClientError> {
    let items = response
        .data
        .into_iter()
        .map(convert_to_domain_item::<T>)
        .collect::<Result<Vec<T>, ClientError>>()?;

    let pagination = match response.meta {
        Some(meta) => Pagination::from_meta(meta, response.links),
        None => Pagination::single_page(items.len()),
    };

    Ok(Page { items, pagination })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Faculty;
    use school_admin_data::models::PageMeta;
    use serde_json::json;

    #[test]
    fn test_params_for_paged_query() {
        let params = convert_to_data_params(&Query::default());
        assert_eq!(params.per_page, Some(10));
        assert_eq!(params.page, Some(1));
        assert_eq!(params.search, "");
    }

    #[test]
    fn test_params_for_all_option_drop_page() {
        let query = Query::default().with_page(5).with_items_per_page(None).with_page(7);
        let params = convert_to_data_params(&query);
        assert_eq!(params.per_page, None);
        assert_eq!(params.page, None);
    }

    #[test]
    fn test_convert_paged_envelope() {
        let meta = PageMeta::paginate("/academics/faculties", 25, 10, 1);
        let response = ListResponse {
            data: (1..=10)
                .map(|id| json!({"id": id, "name": format!("Faculty {}", id), "code": format!("F{}", id)}))
                .collect(),
            links: Some(meta.edge_links()),
            meta: Some(meta),
        };

        let page: Page<Faculty> = convert_to_domain_page(response).unwrap();
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.pagination.last_page, 3);
        assert_eq!(page.pagination.total, 25);
        assert!(page.pagination.has_next());
    }

    #[test]
    fn test_convert_rejects_malformed_item() {
        let response = ListResponse {
            data: vec![json!({"id": 1, "title": "no name or code"})],
            links: None,
            meta: None,
        };

        let error = convert_to_domain_page::<Faculty>(response).unwrap_err();
        assert!(matches!(error, ClientError::Shape(_)));
        assert!(error.to_string().contains("faculties"));
    }
}
