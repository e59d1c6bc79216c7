use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wardrobe::progress::spinner;
use wardrobe::{cli, config, input, services, setup, DashboardSession, SetupSession};
use cli::{Cli, Commands};
use config::Config;
use services::{Classifier, FaceVerifier, GeminiClient, JsonProfileStore, LocalObjectStore};
use wardrobe_common::{judge_clothing, judge_face, PreviewRegistry, SlotState};

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 保存先（画像・レコード）を開く
fn open_stores(config: &Config) -> anyhow::Result<(LocalObjectStore, JsonProfileStore)> {
    let data_dir = config.data_dir().context("データディレクトリを決定できません")?;
    Ok((
        LocalObjectStore::new(&data_dir, config.public_base_url.clone()),
        JsonProfileStore::new(&data_dir),
    ))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let mut config = Config::load().context("設定ファイルの読み込みに失敗しました")?;
    let owner_id = cli.owner.unwrap_or_else(|| config.owner_id.clone());

    match cli.command {
        Commands::Setup => {
            println!("👕 wardrobe - プロフィール設定\n");
            let client = GeminiClient::from_config(&config)?;
            let (store, records) = open_stores(&config)?;

            let session = SetupSession::new(PreviewRegistry::new());
            match setup::run_interactive(&session, &client, &store, &records, &owner_id).await? {
                Some(receipt) => {
                    println!("\n✔ プロフィールを保存しました");
                    println!("  Top:    {} ({})", receipt.top.name, receipt.top.image_url);
                    println!("  Bottom: {} ({})", receipt.bottom.name, receipt.bottom.image_url);
                }
                None => println!("\n保存せずに終了しました"),
            }
        }

        Commands::Classify { image, category } => {
            let client = GeminiClient::from_config(&config)?;
            let file = input::load_image(&image).await?;
            file.validate()?;

            let pb = spinner("Analyzing clothing...");
            let report = client.classify(&file, category).await;
            pb.finish_and_clear();

            match judge_clothing(report?, category) {
                Ok(result) => {
                    println!("✔ {}", result.name);
                    println!("  category:    {}", result.category);
                    println!("  color:       {}", result.color);
                    println!("  description: {}", result.description);
                    if let Some(brand) = result.brand {
                        println!("  brand:       {}", brand);
                    }
                }
                Err(rejection) => println!("✖ {}", rejection),
            }
        }

        Commands::VerifyFace { image } => {
            let client = GeminiClient::from_config(&config)?;
            let file = input::load_image(&image).await?;
            file.validate()?;

            let pb = spinner("Verifying face...");
            let report = client.verify_face(&file).await;
            pb.finish_and_clear();

            match judge_face(report?) {
                Ok(verification) => {
                    println!("✔ Face verified (quality: {:?})", verification.quality);
                    for issue in verification.issues {
                        println!("  - {}", issue);
                    }
                }
                Err(rejection) => println!("✖ {}", rejection),
            }
        }

        Commands::Add { images, category } => {
            let client = GeminiClient::from_config(&config)?;
            let (store, records) = open_stores(&config)?;
            let session = DashboardSession::load(&records, &owner_id, PreviewRegistry::new()).await?;
            let file = input::load_dropped(&images).await?;

            let pb = spinner("Analyzing clothing...");
            let analyzed = session.drop_clothing(category, file, &client).await;
            pb.finish_and_clear();
            analyzed?;

            let failure = match session.state().clothing_slot().state() {
                SlotState::Failed { error, .. } => Some(error.clone()),
                _ => None,
            };
            if let Some(error) = failure {
                println!("✖ {}", error);
                return Ok(());
            }

            let item = session.save_clothing(&store, &records).await?;
            println!("✔ Added {} [{}] (id: {})", item.name, item.category, item.id);
        }

        Commands::Face { images } => {
            let client = GeminiClient::from_config(&config)?;
            let (store, records) = open_stores(&config)?;
            let session = DashboardSession::load(&records, &owner_id, PreviewRegistry::new()).await?;
            let file = input::load_dropped(&images).await?;

            let pb = spinner("Verifying face...");
            let verified = session.drop_face(file, &client).await;
            pb.finish_and_clear();
            verified?;

            let failure = match session.state().face_slot().state() {
                SlotState::Failed { error, .. } => Some(error.clone()),
                _ => None,
            };
            if let Some(error) = failure {
                println!("✖ {}", error);
                return Ok(());
            }

            let profile = session.save_face(&store, &records).await?;
            println!(
                "✔ Profile picture updated: {}",
                profile.profile_pic.unwrap_or_default()
            );
        }

        Commands::List => {
            let (_, records) = open_stores(&config)?;
            let session = DashboardSession::load(&records, &owner_id, PreviewRegistry::new()).await?;
            let state = session.state();

            if !state.has_profile() {
                println!("プロフィールが未設定です。`wardrobe setup` を実行してください");
            }
            for category in wardrobe_common::ClothingCategory::ALL {
                println!("\n[{}]", category);
                for item in state.items_in(category) {
                    let color = item.color.as_deref().unwrap_or("-");
                    println!("  {:>4}  {} ({})", item.id, item.name, color);
                }
            }
            println!(
                "\nProfile picture: {}",
                state.profile_pic().unwrap_or("(not set)")
            );
        }

        Commands::Generate { head, top, bottom, output } => {
            let (_, records) = open_stores(&config)?;
            let session = DashboardSession::load(&records, &owner_id, PreviewRegistry::new()).await?;
            for id in [head, top, bottom].into_iter().flatten() {
                session.update(|d| d.select(&id))?;
            }
            // 検証はクライアント作成前に行う
            session.state().generation_request()?;
            let client = GeminiClient::from_config(&config)?;

            let pb = spinner("Generating outfit...");
            let result = session.generate(&client).await;
            pb.finish_and_clear();

            let (mime, bytes) = services::decode_data_url(&result?)?;
            std::fs::write(&output, bytes)
                .with_context(|| format!("{} に書き込めません", output.display()))?;
            println!("✔ コーデ画像を保存: {} ({})", output.display(), mime);
        }

        Commands::Config { set_api_key, show } => {
            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  解析モデル: {}", config.classify_model);
                println!("  生成モデル: {}", config.image_model);
                println!("  データ: {}", config.data_dir()?.display());
                println!("  オーナー: {}", config.owner_id);
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}
