mod astro;
mod dsn;
mod scenarios;
