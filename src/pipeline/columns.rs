//! Column names of the BigMart-style sales tables

/// Product identifier, e.g. "FDA15"
pub const ITEM_ID: &str = "Item_Identifier";
/// Product weight (nullable in raw data)
pub const ITEM_WEIGHT: &str = "Item_Weight";
/// Fat content label (noisy in raw data)
pub const ITEM_FAT_CONTENT: &str = "Item_Fat_Content";
/// Display visibility share; 0 is a sentinel for "unknown"
pub const ITEM_VISIBILITY: &str = "Item_Visibility";
/// Product type label
pub const ITEM_TYPE: &str = "Item_Type";
/// Maximum retail price
pub const ITEM_MRP: &str = "Item_MRP";
/// Outlet identifier, e.g. "OUT049"
pub const OUTLET_ID: &str = "Outlet_Identifier";
/// Year the outlet opened
pub const OUTLET_ESTABLISHMENT_YEAR: &str = "Outlet_Establishment_Year";
/// Outlet size label (nullable in raw data)
pub const OUTLET_SIZE: &str = "Outlet_Size";
/// Outlet location tier label
pub const OUTLET_LOCATION_TYPE: &str = "Outlet_Location_Type";
/// Outlet type label
pub const OUTLET_TYPE: &str = "Outlet_Type";
/// Target column; present only in the labeled table
pub const TARGET: &str = "Item_Outlet_Sales";

// Derived columns
pub const OUTLET_AGE: &str = "Outlet_Age";
pub const ITEM_CATEGORY: &str = "Item_Category";
pub const PRICE_PER_UNIT_WEIGHT: &str = "Price_per_Unit_Weight";
pub const ITEM_VISIBILITY_LOG: &str = "Item_Visibility_Log";
pub const OUTLET_AGE_CATEGORY: &str = "Outlet_Age_Category";
pub const NON_CONSUMABLE: &str = "Non_Consumable";

/// Raw columns every input table must carry
pub const REQUIRED_RAW: &[&str] = &[
    ITEM_ID,
    ITEM_WEIGHT,
    ITEM_FAT_CONTENT,
    ITEM_VISIBILITY,
    ITEM_TYPE,
    ITEM_MRP,
    OUTLET_ID,
    OUTLET_ESTABLISHMENT_YEAR,
    OUTLET_SIZE,
    OUTLET_LOCATION_TYPE,
    OUTLET_TYPE,
];

/// Nominal columns one-hot encoded with a dropped reference category
pub const ONEHOT_COLUMNS: &[&str] = &[
    ITEM_FAT_CONTENT,
    OUTLET_SIZE,
    OUTLET_LOCATION_TYPE,
    ITEM_CATEGORY,
    OUTLET_AGE_CATEGORY,
    OUTLET_TYPE,
    ITEM_TYPE,
];

/// Continuous columns standard-scaled with fit-time parameters
pub const SCALED_COLUMNS: &[&str] = &[
    ITEM_WEIGHT,
    ITEM_VISIBILITY,
    ITEM_MRP,
    PRICE_PER_UNIT_WEIGHT,
    ITEM_VISIBILITY_LOG,
];
