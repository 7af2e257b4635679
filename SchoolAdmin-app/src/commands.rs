use std::fmt::Write;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde_json::Value;
use tracing::{info, instrument};

use school_admin_domain::entities::{
    AcademicLevel, Country, District, EmailConfig, Faculty, FiscalYear, Grade, GradeGroup,
    Municipality, Province, ResourceDescriptor, ResourceItem, Student, Subject, SubjectType,
    TaxCategory, Vehicle, Voucher,
};
use school_admin_domain::repository::ResourceRepositoryTrait;
use school_admin_domain::services::{
    AddressBook, AddressSelection, AddressService, Page, PaginatedResourceClient, Pagination, Query,
};

use crate::cli::{Command, ResourceKind};

/// Bind `$item` to the entity type behind `$kind` and evaluate `$body`
macro_rules! for_resource {
    ($kind:expr, $item:ident => $body:expr) => {
        match $kind {
            ResourceKind::AcademicLevels => {
                type $item = AcademicLevel;
                $body
            }
            ResourceKind::Grades => {
                type $item = Grade;
                $body
            }
            ResourceKind::GradeGroups => {
                type $item = GradeGroup;
                $body
            }
            ResourceKind::Faculties => {
                type $item = Faculty;
                $body
            }
            ResourceKind::Subjects => {
                type $item = Subject;
                $body
            }
            ResourceKind::SubjectTypes => {
                type $item = SubjectType;
                $body
            }
            ResourceKind::FiscalYears => {
                type $item = FiscalYear;
                $body
            }
            ResourceKind::TaxCategories => {
                type $item = TaxCategory;
                $body
            }
            ResourceKind::Vouchers => {
                type $item = Voucher;
                $body
            }
            ResourceKind::Vehicles => {
                type $item = Vehicle;
                $body
            }
            ResourceKind::Emails => {
                type $item = EmailConfig;
                $body
            }
            ResourceKind::Students => {
                type $item = Student;
                $body
            }
            ResourceKind::Countries => {
                type $item = Country;
                $body
            }
            ResourceKind::Provinces => {
                type $item = Province;
                $body
            }
            ResourceKind::Districts => {
                type $item = District;
                $body
            }
            ResourceKind::Municipalities => {
                type $item = Municipality;
                $body
            }
        }
    };
}

const ALL_RESOURCES: [ResourceKind; 16] = [
    ResourceKind::AcademicLevels,
    ResourceKind::Grades,
    ResourceKind::GradeGroups,
    ResourceKind::Faculties,
    ResourceKind::Subjects,
    ResourceKind::SubjectTypes,
    ResourceKind::FiscalYears,
    ResourceKind::TaxCategories,
    ResourceKind::Vouchers,
    ResourceKind::Vehicles,
    ResourceKind::Emails,
    ResourceKind::Students,
    ResourceKind::Countries,
    ResourceKind::Provinces,
    ResourceKind::Districts,
    ResourceKind::Municipalities,
];

/// Collection behind a resource argument
pub fn descriptor(kind: ResourceKind) -> ResourceDescriptor {
    for_resource!(kind, T => T::RESOURCE)
}

/// Run one console command and return what it prints
#[instrument(skip(repository))]
pub async fn execute(
    repository: Arc<dyn ResourceRepositoryTrait>,
    command: Command,
) -> anyhow::Result<String> {
    match command {
        Command::Resources => Ok(render_resources()),
        Command::List {
            resource,
            search,
            per_page,
            page,
        } => {
            let query = Query::default()
                .with_search(search)
                .with_items_per_page(per_page.0)
                .with_page(page);
            for_resource!(resource, T => list::<T>(repository, query).await)
        }
        Command::Show { resource, id } => {
            for_resource!(resource, T => show::<T>(repository, id).await)
        }
        Command::Create { resource, json } => {
            for_resource!(resource, T => create::<T>(repository, &json).await)
        }
        Command::Update { resource, id, json } => {
            for_resource!(resource, T => update::<T>(repository, id, &json).await)
        }
        Command::Toggle { resource, id } => {
            for_resource!(resource, T => toggle::<T>(repository, id).await)
        }
        Command::Addresses {
            country,
            province,
            district,
        } => {
            let selection = AddressSelection::default()
                .select_country(country)
                .select_province(province)
                .select_district(district);
            addresses(repository, selection).await
        }
    }
}

async fn list<T: ResourceItem>(
    repository: Arc<dyn ResourceRepositoryTrait>,
    query: Query,
) -> anyhow::Result<String> {
    let client = PaginatedResourceClient::<T>::new(repository);
    let page = client
        .list(query)
        .await
        .with_context(|| format!("listing {} failed", T::RESOURCE.name))?;
    info!("Listed {} {}", page.items.len(), T::RESOURCE.name);
    render_page(&page)
}

async fn show<T: ResourceItem>(
    repository: Arc<dyn ResourceRepositoryTrait>,
    id: u64,
) -> anyhow::Result<String> {
    let client = PaginatedResourceClient::<T>::new(repository);
    let item = client.fetch_one(id).await?;
    render_item(&item)
}

async fn create<T: ResourceItem>(
    repository: Arc<dyn ResourceRepositoryTrait>,
    json: &str,
) -> anyhow::Result<String> {
    let item: T = serde_json::from_str(json)
        .with_context(|| format!("invalid {} item", T::RESOURCE.name))?;

    let client = PaginatedResourceClient::<T>::new(repository);
    let created = client.create(item).await?;
    Ok(format!("Created {}\n", render_item(&created)?))
}

async fn update<T: ResourceItem>(
    repository: Arc<dyn ResourceRepositoryTrait>,
    id: u64,
    json: &str,
) -> anyhow::Result<String> {
    let mut body: Value = serde_json::from_str(json)
        .with_context(|| format!("invalid {} item", T::RESOURCE.name))?;
    let Some(fields) = body.as_object_mut() else {
        bail!("{} item must be a JSON object", T::RESOURCE.name);
    };
    fields.insert("id".to_string(), Value::from(id));

    let item: T = serde_json::from_value(body)
        .with_context(|| format!("invalid {} item", T::RESOURCE.name))?;

    let client = PaginatedResourceClient::<T>::new(repository);
    let updated = client.update(item).await?;
    Ok(format!("Updated {}\n", render_item(&updated)?))
}

async fn toggle<T: ResourceItem>(
    repository: Arc<dyn ResourceRepositoryTrait>,
    id: u64,
) -> anyhow::Result<String> {
    let client = PaginatedResourceClient::<T>::new(repository).with_query(Query::unpaged());
    let echoed = client.change_status(id).await?;

    let current = echoed.or_else(|| client.items().into_iter().find(|item| item.id() == Some(id)));
    match current {
        Some(item) => Ok(format!("Toggled status of {}\n", render_item(&item)?)),
        None => Ok(format!("Toggled status of {} {}\n", T::RESOURCE.name, id)),
    }
}

async fn addresses(
    repository: Arc<dyn ResourceRepositoryTrait>,
    selection: AddressSelection,
) -> anyhow::Result<String> {
    let service = AddressService::new(repository);
    let mut book = AddressBook::new();
    service.load_countries(&mut book).await?;
    service.load_children(&mut book, &selection).await?;

    let mut out = String::new();
    writeln!(out, "Countries")?;
    for country in book.countries.iter() {
        write_node(&mut out, country.id, &country.name, selection.country)?;
    }
    if selection.country.is_some() {
        writeln!(out, "Provinces")?;
        for province in book.provinces_in(&selection) {
            write_node(&mut out, province.id, &province.name, selection.province)?;
        }
    }
    if selection.province.is_some() {
        writeln!(out, "Districts")?;
        for district in book.districts_in(&selection) {
            write_node(&mut out, district.id, &district.name, selection.district)?;
        }
    }
    if selection.district.is_some() {
        writeln!(out, "Municipalities")?;
        for municipality in book.municipalities_in(&selection) {
            write_node(&mut out, municipality.id, &municipality.name, None)?;
        }
    }
    Ok(out)
}

fn write_node(
    out: &mut String,
    id: Option<u64>,
    name: &str,
    selected: Option<u64>,
) -> std::fmt::Result {
    let marker = if id.is_some() && id == selected { " *" } else { "" };
    writeln!(out, "  [{}] {}{}", id.unwrap_or_default(), name, marker)
}

fn render_resources() -> String {
    ALL_RESOURCES
        .iter()
        .map(|kind| {
            let resource = descriptor(*kind);
            format!("{:<16} {}\n", resource.name, resource.path)
        })
        .collect()
}

fn render_item<T: ResourceItem>(item: &T) -> anyhow::Result<String> {
    Ok(format!(
        "{} #{}: {}",
        T::RESOURCE.name,
        item.id().unwrap_or_default(),
        serde_json::to_string(item)?
    ))
}

fn render_page<T: ResourceItem>(page: &Page<T>) -> anyhow::Result<String> {
    let mut out = String::new();
    writeln!(out, "{} ({})", T::RESOURCE.name, T::RESOURCE.path)?;
    for item in &page.items {
        writeln!(out, "  {}", serde_json::to_string(item)?)?;
    }
    writeln!(out, "{}", page.pagination.summary())?;
    writeln!(out, "Pages: {}", render_pager(&page.pagination))?;
    Ok(out)
}

/// "« 1 [2] 3 ... 9 »" with arrows only where a neighbour exists
fn render_pager(pagination: &Pagination) -> String {
    let mut parts = Vec::new();
    if pagination.has_previous() {
        parts.push("«".to_string());
    }
    for entry in pagination.page_window() {
        parts.push(match entry {
            Some(page) if page == pagination.current_page => format!("[{}]", page),
            Some(page) => page.to_string(),
            None => "...".to_string(),
        });
    }
    if pagination.has_next() {
        parts.push("»".to_string());
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PageSize;
    use school_admin_domain::repository::InMemoryResourceStore;
    use serde_json::json;

    fn repository() -> (InMemoryResourceStore, Arc<dyn ResourceRepositoryTrait>) {
        let subjects = (1..=25)
            .map(|n| json!({"name": format!("Subject {}", n), "code": format!("S{:02}", n)}))
            .collect();
        let store = InMemoryResourceStore::new()
            .with_items("/academics/subjects", subjects)
            .with_items("/addresses/countries", vec![json!({"id": 1, "name": "Nepal"})])
            .with_items(
                "/addresses/provinces",
                vec![
                    json!({"id": 3, "country_id": 1, "name": "Bagmati"}),
                    json!({"id": 4, "country_id": 1, "name": "Gandaki"}),
                ],
            );
        (store.clone(), Arc::new(store))
    }

    fn list_subjects(page: u32, per_page: Option<u32>) -> Command {
        Command::List {
            resource: ResourceKind::Subjects,
            search: String::new(),
            per_page: PageSize(per_page),
            page,
        }
    }

    #[tokio::test]
    async fn test_list_renders_page_and_pager() {
        let (_, repository) = repository();
        let output = execute(repository, list_subjects(2, Some(10))).await.unwrap();

        assert!(output.starts_with("subjects (/academics/subjects)\n"));
        assert!(output.contains("\"name\":\"Subject 11\""));
        assert!(!output.contains("\"name\":\"Subject 21\""));
        assert!(output.contains("Showing 11 to 20 of 25 entries"));
        assert!(output.contains("Pages: « 1 [2] 3 »"));
    }

    #[tokio::test]
    async fn test_list_all_option() {
        let (_, repository) = repository();
        let output = execute(repository, list_subjects(4, None)).await.unwrap();
        assert!(output.contains("Showing 1 to 25 of 25 entries"));
        assert!(output.contains("Pages: [1]"));
    }

    #[tokio::test]
    async fn test_create_update_and_toggle() {
        let (store, repository) = repository();

        let created = execute(
            repository.clone(),
            Command::Create {
                resource: ResourceKind::Subjects,
                json: r#"{"name": "Astronomy", "code": "AST"}"#.to_string(),
            },
        )
        .await
        .unwrap();
        assert!(created.starts_with("Created subjects #26"));
        assert_eq!(store.len("/academics/subjects").unwrap(), 26);

        let updated = execute(
            repository.clone(),
            Command::Update {
                resource: ResourceKind::Subjects,
                id: 26,
                json: r#"{"name": "Astrophysics", "code": "AST"}"#.to_string(),
            },
        )
        .await
        .unwrap();
        assert!(updated.contains("Astrophysics"));

        let toggled = execute(
            repository.clone(),
            Command::Toggle {
                resource: ResourceKind::Subjects,
                id: 26,
            },
        )
        .await
        .unwrap();
        assert!(toggled.contains("\"status\":false"));

        let shown = execute(
            repository,
            Command::Show {
                resource: ResourceKind::Subjects,
                id: 26,
            },
        )
        .await
        .unwrap();
        assert!(shown.contains("Astrophysics"));
        assert!(shown.contains("\"status\":false"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_reported() {
        let (store, repository) = repository();

        let error = execute(
            repository.clone(),
            Command::Create {
                resource: ResourceKind::Subjects,
                json: r#"{"name": "", "code": "AST"}"#.to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(error.to_string().starts_with("Validation error: name:"));

        let error = execute(
            repository.clone(),
            Command::Update {
                resource: ResourceKind::Subjects,
                id: 1,
                json: "[1, 2]".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(error.to_string(), "subjects item must be a JSON object");

        let error = execute(
            repository,
            Command::Show {
                resource: ResourceKind::Subjects,
                id: 99,
            },
        )
        .await
        .unwrap_err();
        assert!(error.to_string().starts_with("Not found"));
        assert_eq!(store.len("/academics/subjects").unwrap(), 25);
    }

    #[tokio::test]
    async fn test_resources_listing_covers_every_kind() {
        let (_, repository) = repository();
        let output = execute(repository, Command::Resources).await.unwrap();
        assert_eq!(output.lines().count(), ALL_RESOURCES.len());
        assert!(output.contains("/accounts/masters/fiscal-years"));
        assert!(output.contains("/transportation/vehicles"));
    }

    #[tokio::test]
    async fn test_addresses_follow_selection() {
        let (_, repository) = repository();
        let output = execute(
            repository,
            Command::Addresses {
                country: Some(1),
                province: Some(4),
                district: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(
            output,
            "Countries\n  [1] Nepal *\nProvinces\n  [3] Bagmati\n  [4] Gandaki *\nDistricts\n"
        );
    }
}
