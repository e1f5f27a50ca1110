use serde::{Deserialize, Serialize};

use cloudpos_core::ItemId;

use crate::item::{CatalogItem, Category};

/// The static, ordered product grid.
///
/// Order is display order; placeholder slots keep their grid position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    items: Vec<CatalogItem>,
}

impl Catalog {
    pub fn from_items(items: Vec<CatalogItem>) -> Self {
        Self { items }
    }

    /// Load a catalog from a JSON array of item records.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// All slots, in display order (placeholders included).
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Items that can actually be sold (placeholders excluded).
    pub fn purchasable(&self) -> impl Iterator<Item = &CatalogItem> {
        self.items.iter().filter(|item| !item.is_placeholder())
    }

    pub fn get(&self, id: &ItemId) -> Option<&CatalogItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// The built-in grid layout: two espresso drinks and eight empty slots.
    pub fn standard() -> Self {
        fn item(
            id: &str,
            name: &str,
            price: u64,
            image: &str,
            color: &str,
        ) -> CatalogItem {
            CatalogItem {
                id: ItemId::new(id),
                name: name.to_string(),
                price,
                category: Category::Beverage,
                image: image.to_string(),
                color: color.to_string(),
            }
        }

        let mut items = vec![
            item(
                "b1",
                "美式咖啡",
                65,
                "https://images.unsplash.com/photo-1509042239860-f550ce710b93?auto=format&fit=crop&q=80&w=200",
                "bg-amber-100",
            ),
            item(
                "b2",
                "拿鐵咖啡",
                95,
                "https://images.unsplash.com/photo-1541167760496-1628856ab752?auto=format&fit=crop&q=80&w=200",
                "bg-amber-100",
            ),
        ];
        for n in 1..=8 {
            items.push(item(&format!("blank{n}"), "", 0, "", "bg-slate-50"));
        }

        Self { items }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_has_two_purchasable_items() {
        let catalog = Catalog::standard();
        assert_eq!(catalog.items().len(), 10);
        let purchasable: Vec<_> = catalog.purchasable().collect();
        assert_eq!(purchasable.len(), 2);
        assert_eq!(purchasable[0].name, "美式咖啡");
        assert_eq!(purchasable[0].price, 65);
        assert_eq!(purchasable[1].name, "拿鐵咖啡");
        assert_eq!(purchasable[1].price, 95);
    }

    #[test]
    fn lookup_by_id_finds_placeholders_too() {
        let catalog = Catalog::standard();
        assert!(catalog.get(&ItemId::new("b1")).is_some());
        assert!(catalog.get(&ItemId::new("blank3")).unwrap().is_placeholder());
        assert!(catalog.get(&ItemId::new("nope")).is_none());
    }

    #[test]
    fn from_json_accepts_the_wire_shape() {
        let raw = r#"[
            {
                "id": "b1",
                "name": "美式咖啡",
                "price": 65,
                "category": "飲品",
                "image": "",
                "color": "bg-amber-100"
            }
        ]"#;
        let catalog = Catalog::from_json(raw).unwrap();
        assert_eq!(catalog.items().len(), 1);
        assert_eq!(catalog.items()[0].category, Category::Beverage);
    }

    #[test]
    fn from_json_rejects_a_non_array_payload() {
        assert!(Catalog::from_json(r#"{"oops": true}"#).is_err());
    }
}
