use serde::de::DeserializeOwned;
use serde::Serialize;
use validator::Validate;

/// A named backend collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceDescriptor {
    /// Human-readable plural name, used in logs and messages
    pub name: &'static str,
    /// Base path of the collection endpoint
    pub path: &'static str,
}

/// An item of a backend collection
///
/// Implementors describe where their collection lives and how to read their
/// identity; everything else about the item shape is carried by serde and
/// validator derives.
pub trait ResourceItem:
    Serialize + DeserializeOwned + Validate + Clone + Send + Sync + 'static
{
    /// The collection this item belongs to
    const RESOURCE: ResourceDescriptor;

    /// Server-assigned identity, `None` until the item has been created
    fn id(&self) -> Option<u64>;
}

/// Implement [`ResourceItem`] for an entity with an `id: Option<u64>` field
macro_rules! resource_item {
    ($item:ty, $name:literal, $path:literal) => {
        impl $crate::entities::resource::ResourceItem for $item {
            const RESOURCE: $crate::entities::resource::ResourceDescriptor =
                $crate::entities::resource::ResourceDescriptor {
                    name: $name,
                    path: $path,
                };

            fn id(&self) -> Option<u64> {
                self.id
            }
        }
    };
}

pub(crate) use resource_item;
