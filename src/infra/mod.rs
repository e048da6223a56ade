pub mod in_memory_destination;
pub mod mysql_adapter;
