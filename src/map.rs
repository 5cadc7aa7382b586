pub mod sorted_map;
