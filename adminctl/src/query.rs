//! `adminctl query`: merge table options into a URL query string.

use portal::{PageOptions, PortalConfig, QueryParamCodec, SortKey};

use crate::cli::QueryArgs;

pub fn run_query(args: QueryArgs) {
    let codec = QueryParamCodec::from_config(&PortalConfig::default());
    let options = options_from_args(&args);
    let encoded = codec.encode(&options, &args.current);

    println!("{encoded}");
    if QueryParamCodec::needs_navigation(&encoded, &args.current) {
        eprintln!("navigate: yes");
    } else {
        eprintln!("navigate: no");
    }
}

fn options_from_args(args: &QueryArgs) -> PageOptions {
    let mut options = PageOptions::new(args.page, args.page_size);
    if let Some(ordering) = &args.ordering {
        options.ordering = ordering.split(',').filter_map(SortKey::parse).collect();
    }
    options.search = args.search.clone();
    options.extra_filters = args.filters.iter().cloned().collect();
    options
}
