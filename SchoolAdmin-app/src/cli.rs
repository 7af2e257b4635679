use clap::{Parser, Subcommand, ValueEnum};

/// Command line of the SchoolAdmin console
#[derive(Parser, Debug)]
#[command(name = "school-admin", about = "Browse and edit SchoolAdmin back-office resources")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the known resources and their paths
    Resources,

    /// Show one page of a resource
    List {
        #[arg(value_enum)]
        resource: ResourceKind,

        /// Free-text search
        #[arg(short, long, default_value = "")]
        search: String,

        /// Page size, or "all" for the whole collection
        #[arg(long, default_value = "10", value_parser = parse_page_size)]
        per_page: PageSize,

        /// 1-based page number
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Show a single item
    Show {
        #[arg(value_enum)]
        resource: ResourceKind,
        id: u64,
    },

    /// Create an item from a JSON object
    Create {
        #[arg(value_enum)]
        resource: ResourceKind,
        json: String,
    },

    /// Replace an item with a JSON object
    Update {
        #[arg(value_enum)]
        resource: ResourceKind,
        id: u64,
        json: String,
    },

    /// Toggle an item's status
    Toggle {
        #[arg(value_enum)]
        resource: ResourceKind,
        id: u64,
    },

    /// Walk the address hierarchy down the given selection
    Addresses {
        #[arg(long)]
        country: Option<u64>,

        #[arg(long, requires = "country")]
        province: Option<u64>,

        #[arg(long, requires = "province")]
        district: Option<u64>,
    },
}

/// Page size argument; `None` is "all"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(pub Option<u32>);

fn parse_page_size(value: &str) -> Result<PageSize, String> {
    if value.eq_ignore_ascii_case("all") {
        return Ok(PageSize(None));
    }
    match value.parse::<u32>() {
        Ok(0) => Err("page size must be at least 1".to_string()),
        Ok(size) => Ok(PageSize(Some(size))),
        Err(_) => Err(format!("expected a number or \"all\", got {:?}", value)),
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    AcademicLevels,
    Grades,
    GradeGroups,
    Faculties,
    Subjects,
    SubjectTypes,
    FiscalYears,
    TaxCategories,
    Vouchers,
    Vehicles,
    Emails,
    Students,
    Countries,
    Provinces,
    Districts,
    Municipalities,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("school-admin").chain(args.iter().copied()))
    }

    #[test]
    fn test_list_defaults() {
        let args = parse(&["list", "subjects"]).unwrap();
        assert_eq!(
            args.command,
            Command::List {
                resource: ResourceKind::Subjects,
                search: String::new(),
                per_page: PageSize(Some(10)),
                page: 1,
            }
        );
    }

    #[test]
    fn test_list_all_option() {
        let args = parse(&["list", "fiscal-years", "--per-page", "all", "-s", "2081"]).unwrap();
        match args.command {
            Command::List {
                resource,
                search,
                per_page,
                ..
            } => {
                assert_eq!(resource, ResourceKind::FiscalYears);
                assert_eq!(search, "2081");
                assert_eq!(per_page, PageSize(None));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_page_size() {
        assert!(parse(&["list", "grades", "--per-page", "0"]).is_err());
        assert!(parse(&["list", "grades", "--per-page", "many"]).is_err());
        assert!(parse(&["list", "teachers"]).is_err());
    }

    #[test]
    fn test_address_selection_must_nest() {
        assert!(parse(&["addresses", "--province", "3"]).is_err());
        let args = parse(&["addresses", "--country", "1", "--province", "3"]).unwrap();
        assert_eq!(
            args.command,
            Command::Addresses {
                country: Some(1),
                province: Some(3),
                district: None,
            }
        );
    }
}
