use std::collections::{BTreeMap, BTreeSet};

/// Product-classification buckets a scheme may reference. Buckets outside
/// this set are ignored.
pub const PRODUCT_BUCKETS: [&str; 8] = [
    "grps",
    "skus",
    "materials",
    "categories",
    "otherGroups",
    "wandaGroups",
    "productNames",
    "thinnerGroups",
];

/// A scheme's `productData` object: bucket name to material identifiers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductData {
    buckets: BTreeMap<String, Vec<String>>,
}

impl ProductData {
    pub fn new(buckets: BTreeMap<String, Vec<String>>) -> Self {
        Self { buckets }
    }

    pub fn from_bucket(bucket: &str, materials: &[&str]) -> Self {
        let mut buckets = BTreeMap::new();
        buckets.insert(
            bucket.to_string(),
            materials.iter().map(|m| m.to_string()).collect(),
        );
        Self { buckets }
    }

    /// Union of material identifiers across the known buckets.
    pub fn material_set(&self) -> BTreeSet<String> {
        let mut set = BTreeSet::new();
        for bucket in PRODUCT_BUCKETS {
            if let Some(materials) = self.buckets.get(bucket) {
                set.extend(materials.iter().cloned());
            }
        }
        set
    }
}

/// How a scheme's material set restricts the sales ledger. The main scheme
/// treats an empty set as "no filter"; additional schemes keep the empty set
/// and therefore match nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialScope {
    All,
    Set(BTreeSet<String>),
}

impl MaterialScope {
    pub fn for_main_scheme(product_data: &ProductData) -> Self {
        let set = product_data.material_set();
        if set.is_empty() {
            Self::All
        } else {
            Self::Set(set)
        }
    }

    pub fn for_additional_scheme(product_data: &ProductData) -> Self {
        Self::Set(product_data.material_set())
    }

    pub fn matches(&self, material: &str) -> bool {
        match self {
            Self::All => true,
            Self::Set(set) => set.contains(material),
        }
    }
}
