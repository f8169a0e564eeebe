pub mod level_cache_evictor;
