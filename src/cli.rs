use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wardrobe_common::ClothingCategory;

#[derive(Parser)]
#[command(name = "wardrobe")]
#[command(about = "衣類写真のAI解析・コーデ画像生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// オーナーID（設定ファイルの値を上書き）
    #[arg(long, global = true)]
    pub owner: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// プロフィール設定ウィザード
    Setup,

    /// 衣類画像を解析
    Classify {
        /// 画像ファイル
        image: PathBuf,

        /// 期待するカテゴリ (head/top/bottom)
        #[arg(short, long)]
        category: Option<ClothingCategory>,
    },

    /// 顔写真を検証
    VerifyFace {
        /// 画像ファイル
        image: PathBuf,
    },

    /// 衣類を追加
    Add {
        /// 画像ファイル（1枚）
        #[arg(required = true, value_name = "IMAGE")]
        images: Vec<PathBuf>,

        /// カテゴリ (head/top/bottom)
        #[arg(short, long)]
        category: ClothingCategory,
    },

    /// プロフィール写真を登録
    Face {
        /// 画像ファイル（1枚）
        #[arg(required = true, value_name = "IMAGE")]
        images: Vec<PathBuf>,
    },

    /// 保存済みアイテム一覧
    List,

    /// コーデ画像を生成
    Generate {
        /// 帽子のアイテムID
        #[arg(long)]
        head: Option<String>,

        /// トップスのアイテムID
        #[arg(long)]
        top: Option<String>,

        /// ボトムスのアイテムID
        #[arg(long)]
        bottom: Option<String>,

        /// 出力画像ファイル
        #[arg(short, long, default_value = "outfit.png")]
        output: PathBuf,
    },

    /// 設定
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from(["wardrobe", "generate", "--top", "3", "--bottom", "4"]);
        match cli.command {
            Commands::Generate { head, top, bottom, output } => {
                assert!(head.is_none());
                assert_eq!(top.as_deref(), Some("3"));
                assert_eq!(bottom.as_deref(), Some("4"));
                assert_eq!(output, PathBuf::from("outfit.png"));
            }
            _ => panic!("generate expected"),
        }
    }

    #[test]
    fn test_parse_category() {
        let cli = Cli::parse_from(["wardrobe", "add", "hat.png", "--category", "hat", "-v"]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Add { category, .. } => assert_eq!(category, ClothingCategory::Head),
            _ => panic!("add expected"),
        }
    }

    #[test]
    fn test_rejects_unknown_category() {
        assert!(Cli::try_parse_from(["wardrobe", "add", "x.png", "--category", "shoes"]).is_err());
    }

    #[test]
    fn test_face_collects_dropped_files() {
        let cli = Cli::parse_from(["wardrobe", "face", "a.jpg", "b.jpg"]);
        match cli.command {
            Commands::Face { images } => assert_eq!(images.len(), 2),
            _ => panic!("face expected"),
        }
        assert!(Cli::try_parse_from(["wardrobe", "face"]).is_err());
    }
}
