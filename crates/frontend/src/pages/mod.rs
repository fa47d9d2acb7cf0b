pub mod pin_map;
