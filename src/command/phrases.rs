//! Built-in multilingual trigger phrases.
//!
//! Table order is match priority: the first command with a containment hit wins,
//! so commands whose phrases embed another command's phrase ("unmute" / "mute",
//! "exit fullscreen" / "fullscreen") are listed ahead of it.

use super::CommandId;
use crate::locale::Language;

pub(crate) type PhraseRow = (CommandId, &'static [(Language, &'static [&'static str])]);

pub(crate) const BUILTIN_PHRASES: &[PhraseRow] = &[
    (
        CommandId::Play,
        &[
            (Language::En, &["play", "resume", "start video"]),
            (Language::ZhTw, &["播放", "開始播放"]),
            (Language::ZhCn, &["播放", "开始播放"]),
            (Language::Ja, &["再生"]),
            (Language::Ko, &["재생"]),
            (Language::Es, &["reproducir"]),
            (Language::Pt, &["reproduzir", "tocar"]),
            (Language::Fr, &["jouer", "lecture"]),
            (Language::De, &["spielen", "abspielen"]),
            (Language::Ru, &["воспроизвести", "играть"]),
            (Language::Ar, &["تشغيل"]),
        ],
    ),
    (
        CommandId::Pause,
        &[
            (Language::En, &["pause"]),
            (Language::ZhTw, &["暫停"]),
            (Language::ZhCn, &["暂停"]),
            (Language::Ja, &["一時停止"]),
            (Language::Ko, &["일시정지"]),
            (Language::Es, &["pausar", "pausa"]),
            (Language::Pt, &["pausar"]),
            (Language::Fr, &["pause"]),
            (Language::De, &["pausieren", "pause"]),
            (Language::Ru, &["пауза"]),
            (Language::Ar, &["إيقاف مؤقت"]),
        ],
    ),
    (
        CommandId::Stop,
        &[
            (Language::En, &["stop"]),
            (Language::ZhTw, &["停止"]),
            (Language::ZhCn, &["停止"]),
            (Language::Ja, &["停止", "ストップ"]),
            (Language::Ko, &["정지"]),
            (Language::Es, &["parar", "detener"]),
            (Language::Pt, &["parar"]),
            (Language::Fr, &["arrêter", "arrête"]),
            (Language::De, &["stoppen", "anhalten"]),
            (Language::Ru, &["остановить", "стоп"]),
            (Language::Ar, &["توقف"]),
        ],
    ),
    (
        CommandId::Forward10,
        &[
            (Language::En, &["forward 10", "skip 10", "forward ten"]),
            (Language::ZhTw, &["快轉10秒", "向前十秒"]),
            (Language::ZhCn, &["快进10秒", "向前十秒"]),
            (Language::Ja, &["10秒進む", "10秒早送り"]),
            (Language::Ko, &["10초 앞으로"]),
            (Language::Es, &["adelantar 10"]),
            (Language::Pt, &["avançar 10"]),
            (Language::Fr, &["avancer 10"]),
            (Language::De, &["vorspulen 10"]),
            (Language::Ru, &["вперед 10", "вперёд 10"]),
            (Language::Ar, &["تقديم 10"]),
        ],
    ),
    (
        CommandId::Forward20,
        &[
            (Language::En, &["forward 20", "skip 20", "forward twenty"]),
            (Language::ZhTw, &["快轉20秒", "向前二十秒"]),
            (Language::ZhCn, &["快进20秒", "向前二十秒"]),
            (Language::Ja, &["20秒進む", "20秒早送り"]),
            (Language::Ko, &["20초 앞으로"]),
            (Language::Es, &["adelantar 20"]),
            (Language::Pt, &["avançar 20"]),
            (Language::Fr, &["avancer 20"]),
            (Language::De, &["vorspulen 20"]),
            (Language::Ru, &["вперед 20", "вперёд 20"]),
            (Language::Ar, &["تقديم 20"]),
        ],
    ),
    (
        CommandId::Forward30,
        &[
            (Language::En, &["forward 30", "skip 30", "forward thirty"]),
            (Language::ZhTw, &["快轉30秒", "向前三十秒"]),
            (Language::ZhCn, &["快进30秒", "向前三十秒"]),
            (Language::Ja, &["30秒進む", "30秒早送り"]),
            (Language::Ko, &["30초 앞으로"]),
            (Language::Es, &["adelantar 30"]),
            (Language::Pt, &["avançar 30"]),
            (Language::Fr, &["avancer 30"]),
            (Language::De, &["vorspulen 30"]),
            (Language::Ru, &["вперед 30", "вперёд 30"]),
            (Language::Ar, &["تقديم 30"]),
        ],
    ),
    (
        CommandId::Backward10,
        &[
            (Language::En, &["backward 10", "back 10", "rewind 10"]),
            (Language::ZhTw, &["倒轉10秒", "向後十秒"]),
            (Language::ZhCn, &["后退10秒", "快退10秒", "向后十秒"]),
            (Language::Ja, &["10秒戻る", "10秒巻き戻し"]),
            (Language::Ko, &["10초 뒤로"]),
            (Language::Es, &["retroceder 10"]),
            (Language::Pt, &["voltar 10", "retroceder 10 segundos"]),
            (Language::Fr, &["reculer 10"]),
            (Language::De, &["zurückspulen 10"]),
            (Language::Ru, &["назад 10"]),
            (Language::Ar, &["تراجع 10"]),
        ],
    ),
    (
        CommandId::Backward20,
        &[
            (Language::En, &["backward 20", "back 20", "rewind 20"]),
            (Language::ZhTw, &["倒轉20秒", "向後二十秒"]),
            (Language::ZhCn, &["后退20秒", "快退20秒", "向后二十秒"]),
            (Language::Ja, &["20秒戻る", "20秒巻き戻し"]),
            (Language::Ko, &["20초 뒤로"]),
            (Language::Es, &["retroceder 20"]),
            (Language::Pt, &["voltar 20", "retroceder 20 segundos"]),
            (Language::Fr, &["reculer 20"]),
            (Language::De, &["zurückspulen 20"]),
            (Language::Ru, &["назад 20"]),
            (Language::Ar, &["تراجع 20"]),
        ],
    ),
    (
        CommandId::Backward30,
        &[
            (Language::En, &["backward 30", "back 30", "rewind 30"]),
            (Language::ZhTw, &["倒轉30秒", "向後三十秒"]),
            (Language::ZhCn, &["后退30秒", "快退30秒", "向后三十秒"]),
            (Language::Ja, &["30秒戻る", "30秒巻き戻し"]),
            (Language::Ko, &["30초 뒤로"]),
            (Language::Es, &["retroceder 30"]),
            (Language::Pt, &["voltar 30", "retroceder 30 segundos"]),
            (Language::Fr, &["reculer 30"]),
            (Language::De, &["zurückspulen 30"]),
            (Language::Ru, &["назад 30"]),
            (Language::Ar, &["تراجع 30"]),
        ],
    ),
    (
        CommandId::VolumeUp,
        &[
            (Language::En, &["volume up", "louder", "increase volume"]),
            (Language::ZhTw, &["音量調高", "大聲一點"]),
            (Language::ZhCn, &["音量调高", "大声一点"]),
            (Language::Ja, &["音量上げる", "音量を上げて"]),
            (Language::Ko, &["볼륨 올리기", "볼륨 업"]),
            (Language::Es, &["subir volumen", "subir el volumen"]),
            (Language::Pt, &["aumentar volume", "aumentar o volume"]),
            (Language::Fr, &["augmenter volume", "monter le son"]),
            (Language::De, &["lauter"]),
            (Language::Ru, &["громче"]),
            (Language::Ar, &["رفع الصوت"]),
        ],
    ),
    (
        CommandId::VolumeDown,
        &[
            (Language::En, &["volume down", "quieter", "decrease volume"]),
            (Language::ZhTw, &["音量調低", "小聲一點"]),
            (Language::ZhCn, &["音量调低", "小声一点"]),
            (Language::Ja, &["音量下げる", "音量を下げて"]),
            (Language::Ko, &["볼륨 내리기", "볼륨 다운"]),
            (Language::Es, &["bajar volumen", "bajar el volumen"]),
            (Language::Pt, &["diminuir volume", "abaixar o volume"]),
            (Language::Fr, &["baisser volume", "baisser le son"]),
            (Language::De, &["leiser"]),
            (Language::Ru, &["тише"]),
            (Language::Ar, &["خفض الصوت"]),
        ],
    ),
    (
        CommandId::VolumeMax,
        &[
            (Language::En, &["max volume", "volume max", "maximum volume"]),
            (Language::ZhTw, &["音量最大", "最大音量"]),
            (Language::ZhCn, &["音量最大", "最大音量", "音量调到最大"]),
            (Language::Ja, &["音量最大", "最大音量"]),
            (Language::Ko, &["최대 볼륨", "볼륨 최대"]),
            (Language::Es, &["volumen máximo"]),
            (Language::Pt, &["volume máximo"]),
            (Language::Fr, &["volume maximum"]),
            (Language::De, &["maximale lautstärke", "volle lautstärke"]),
            (Language::Ru, &["максимальная громкость"]),
            (Language::Ar, &["أقصى صوت"]),
        ],
    ),
    (
        CommandId::Unmute,
        &[
            (Language::En, &["unmute", "sound on"]),
            (Language::ZhTw, &["解除靜音"]),
            (Language::ZhCn, &["取消静音"]),
            (Language::Ja, &["ミュート解除"]),
            (Language::Ko, &["음소거 해제"]),
            (Language::Es, &["activar sonido", "activar el sonido"]),
            (Language::Pt, &["ativar som", "ativar o som"]),
            (Language::Fr, &["activer son", "activer le son"]),
            (Language::De, &["ton einschalten", "stummschaltung aufheben"]),
            (Language::Ru, &["включить звук", "звук включить"]),
            (Language::Ar, &["إلغاء كتم الصوت"]),
        ],
    ),
    (
        CommandId::Mute,
        &[
            (Language::En, &["mute", "sound off"]),
            (Language::ZhTw, &["靜音"]),
            (Language::ZhCn, &["静音"]),
            (Language::Ja, &["ミュート", "消音"]),
            (Language::Ko, &["음소거"]),
            (Language::Es, &["silenciar"]),
            (Language::Pt, &["mudo", "silenciar"]),
            (Language::Fr, &["muet", "couper le son"]),
            (Language::De, &["stumm", "ton aus"]),
            (Language::Ru, &["без звука", "выключить звук"]),
            (Language::Ar, &["كتم الصوت"]),
        ],
    ),
    (
        CommandId::Speed05,
        &[
            (Language::En, &["half speed", "0.5 speed", "0.5x speed", "slow"]),
            (Language::ZhTw, &["0.5倍速", "半速"]),
            (Language::ZhCn, &["0.5倍速", "半速"]),
            (Language::Ja, &["0.5倍速"]),
            (Language::Ko, &["0.5배속"]),
            (Language::Es, &["0.5 velocidad", "media velocidad"]),
            (Language::Pt, &["velocidade 0.5", "meia velocidade"]),
            (Language::Fr, &["0.5 vitesse", "demi vitesse"]),
            (Language::De, &["halbe geschwindigkeit"]),
            (Language::Ru, &["0.5 скорость", "половинная скорость"]),
            (Language::Ar, &["سرعة 0.5"]),
        ],
    ),
    (
        CommandId::Speed1,
        &[
            (Language::En, &["normal speed", "1x speed", "regular speed"]),
            (Language::ZhTw, &["正常速度"]),
            (Language::ZhCn, &["正常速度", "正常倍速"]),
            (Language::Ja, &["通常速度"]),
            (Language::Ko, &["정상 속도", "보통 속도"]),
            (Language::Es, &["velocidad normal"]),
            (Language::Pt, &["velocidade normal"]),
            (Language::Fr, &["vitesse normale"]),
            (Language::De, &["normale geschwindigkeit"]),
            (Language::Ru, &["обычная скорость"]),
            (Language::Ar, &["السرعة العادية"]),
        ],
    ),
    (
        CommandId::Speed125,
        &[
            (Language::En, &["1.25 speed", "1.25x speed"]),
            (Language::ZhTw, &["1.25倍速"]),
            (Language::ZhCn, &["1.25倍速"]),
            (Language::Ja, &["1.25倍速"]),
            (Language::Ko, &["1.25배속"]),
            (Language::Es, &["1.25 velocidad"]),
            (Language::Pt, &["velocidade 1.25"]),
            (Language::Fr, &["1.25 vitesse"]),
            (Language::De, &["geschwindigkeit 1.25"]),
            (Language::Ru, &["1.25 скорость"]),
            (Language::Ar, &["سرعة 1.25"]),
        ],
    ),
    (
        CommandId::Speed15,
        &[
            (Language::En, &["1.5 speed", "1.5x speed", "fast"]),
            (Language::ZhTw, &["1.5倍速"]),
            (Language::ZhCn, &["1.5倍速", "加快"]),
            (Language::Ja, &["1.5倍速"]),
            (Language::Ko, &["1.5배속"]),
            (Language::Es, &["1.5 velocidad"]),
            (Language::Pt, &["velocidade 1.5"]),
            (Language::Fr, &["1.5 vitesse"]),
            (Language::De, &["geschwindigkeit 1.5"]),
            (Language::Ru, &["1.5 скорость"]),
            (Language::Ar, &["سرعة 1.5"]),
        ],
    ),
    (
        CommandId::Speed2,
        &[
            (Language::En, &["2x speed", "double speed", "2 speed"]),
            (Language::ZhTw, &["2倍速", "兩倍速"]),
            (Language::ZhCn, &["2倍速", "两倍速"]),
            (Language::Ja, &["2倍速"]),
            (Language::Ko, &["2배속"]),
            (Language::Es, &["2 velocidad", "doble velocidad"]),
            (Language::Pt, &["velocidade 2", "velocidade dupla"]),
            (Language::Fr, &["2 vitesse", "double vitesse"]),
            (Language::De, &["doppelte geschwindigkeit"]),
            (Language::Ru, &["2 скорость", "двойная скорость"]),
            (Language::Ar, &["سرعة 2"]),
        ],
    ),
    (
        CommandId::ExitFullscreen,
        &[
            (Language::En, &["exit fullscreen", "exit full screen", "leave fullscreen"]),
            (Language::ZhTw, &["離開全螢幕", "退出全螢幕"]),
            (Language::ZhCn, &["退出全屏"]),
            (Language::Ja, &["フルスクリーン終了", "全画面終了"]),
            (Language::Ko, &["전체화면 나가기", "전체화면 종료"]),
            (Language::Es, &["salir de pantalla completa", "salir pantalla completa"]),
            (Language::Pt, &["sair da tela cheia"]),
            (Language::Fr, &["quitter plein écran", "quitter le plein écran"]),
            (Language::De, &["vollbild beenden", "vollbild verlassen"]),
            (Language::Ru, &["выйти из полного экрана"]),
            (Language::Ar, &["الخروج من ملء الشاشة"]),
        ],
    ),
    (
        CommandId::Fullscreen,
        &[
            (Language::En, &["fullscreen", "full screen", "enter fullscreen"]),
            (Language::ZhTw, &["全螢幕"]),
            (Language::ZhCn, &["全屏"]),
            (Language::Ja, &["フルスクリーン", "全画面"]),
            (Language::Ko, &["전체화면"]),
            (Language::Es, &["pantalla completa"]),
            (Language::Pt, &["tela cheia"]),
            (Language::Fr, &["plein écran"]),
            (Language::De, &["vollbild"]),
            (Language::Ru, &["полный экран"]),
            (Language::Ar, &["ملء الشاشة"]),
        ],
    ),
    (
        CommandId::Bookmark,
        &[
            (Language::En, &["bookmark", "add bookmark", "mark"]),
            (Language::ZhTw, &["書籤", "加入書籤"]),
            (Language::ZhCn, &["书签", "添加书签"]),
            (Language::Ja, &["ブックマーク"]),
            (Language::Ko, &["북마크"]),
            (Language::Es, &["marcador"]),
            (Language::Pt, &["marcador"]),
            (Language::Fr, &["marque-page", "signet"]),
            (Language::De, &["lesezeichen"]),
            (Language::Ru, &["закладка"]),
            (Language::Ar, &["إشارة مرجعية"]),
        ],
    ),
    (
        CommandId::Favorite,
        &[
            (Language::En, &["favorite", "add favorite", "like"]),
            (Language::ZhTw, &["最愛", "加入最愛"]),
            (Language::ZhCn, &["收藏"]),
            (Language::Ja, &["お気に入り"]),
            (Language::Ko, &["즐겨찾기"]),
            (Language::Es, &["favorito"]),
            (Language::Pt, &["favorito"]),
            (Language::Fr, &["favori"]),
            (Language::De, &["favorit"]),
            (Language::Ru, &["избранное"]),
            (Language::Ar, &["مفضل"]),
        ],
    ),
];
