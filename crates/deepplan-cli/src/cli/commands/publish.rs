use crate::cli::args::PublishArgs;
use deepplan_core::publish::{publish_dataset, PublishOptions};

pub fn run(args: PublishArgs) -> anyhow::Result<i32> {
    let opts = PublishOptions {
        username: args.username,
        dataset_name: args.dataset_name,
        source_dir: args.source_dir,
        private: args.private,
        commit_message: args.commit_message,
    };

    let url = publish_dataset(&opts)?;
    println!("Uploaded dataset to: {url}");
    Ok(0)
}
